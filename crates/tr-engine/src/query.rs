//! Read-only query surface exposed upward (UI/reporting).

use chrono::NaiveDate;

use tr_common::{KpiId, ReviewId, ThesisId, Week};

use crate::engine::ReviewEngine;
use crate::model::review::{RagStatus, WeeklyReview};
use crate::model::thesis::Thesis;
use crate::patch::PatchResolver;
use crate::store::ReviewStore;

/// One point in a KPI's history, chart-ready.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiHistoryPoint {
    pub week: Week,
    pub value: Option<f64>,
    pub status: RagStatus,
}

impl<S: ReviewStore> ReviewEngine<S> {
    /// Get a thesis by id.
    pub fn thesis(&self, id: &ThesisId) -> Option<&Thesis> {
        self.state().theses.get(id)
    }

    /// All theses, ordered by id.
    pub fn theses(&self) -> impl Iterator<Item = &Thesis> {
        self.state().theses.values()
    }

    /// Get a review by id.
    pub fn review(&self, id: &ReviewId) -> Option<&WeeklyReview> {
        self.state().reviews.get(id)
    }

    /// The review stored for `(thesis_id, week)`, if any.
    pub fn review_for(&self, thesis_id: &ThesisId, week: Week) -> Option<&WeeklyReview> {
        self.state().review_for(thesis_id, week)
    }

    /// The most recent review of a thesis.
    pub fn latest_review(&self, thesis_id: &ThesisId) -> Option<&WeeklyReview> {
        self.review_history(thesis_id).into_iter().next()
    }

    /// Full review history of a thesis, sorted by week descending.
    pub fn review_history(&self, thesis_id: &ThesisId) -> Vec<&WeeklyReview> {
        let mut history: Vec<&WeeklyReview> = self
            .state()
            .reviews
            .values()
            .filter(|r| &r.thesis_id == thesis_id)
            .collect();
        history.sort_by(|a, b| b.week.cmp(&a.week));
        history
    }

    /// Per-KPI history points in chronological order. `limit` keeps only
    /// the most recent points.
    pub fn kpi_history(
        &self,
        thesis_id: &ThesisId,
        kpi_id: &KpiId,
        limit: Option<usize>,
    ) -> Vec<KpiHistoryPoint> {
        let mut points: Vec<KpiHistoryPoint> = self
            .state()
            .reviews
            .values()
            .filter(|r| &r.thesis_id == thesis_id)
            .filter_map(|r| {
                r.reading(kpi_id).map(|reading| KpiHistoryPoint {
                    week: r.week,
                    value: reading.value,
                    status: reading.status,
                })
            })
            .collect();
        points.sort_by_key(|p| p.week);
        if let Some(limit) = limit {
            let excess = points.len().saturating_sub(limit);
            points.drain(..excess);
        }
        points
    }

    /// Whether a thesis's review cadence has lapsed: true when more than
    /// `threshold_days` have passed since the start (Monday) of the most
    /// recent review's week, or when no review exists at all.
    pub fn is_review_overdue(
        &self,
        thesis_id: &ThesisId,
        threshold_days: i64,
        today: NaiveDate,
    ) -> bool {
        match self.latest_review(thesis_id) {
            Some(review) => (today - review.week.start_date()).num_days() > threshold_days,
            None => true,
        }
    }
}
