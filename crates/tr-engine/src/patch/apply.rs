//! Candidate review construction from a validated patch.
//!
//! A patch is treated as a sparse overlay keyed by id: the candidate
//! review always materializes the full defined set (every KPI, every
//! assumption, every kill criterion), so the output shape never depends
//! on which optional fields the input happened to include.
//!
//! Kill-criteria statuses are carried over from any pre-existing review
//! for the same `(thesis_id, week)`. A patch updates KPIs, events, and
//! the decision; it does not overwrite assumption or kill-criteria
//! judgment calls already recorded by the operator.

use chrono::{DateTime, Utc};

use crate::lifecycle::{normalize, recompute};
use crate::model::review::{
    AssumptionHealth, AssumptionStatusEntry, KpiReading, RagStatus, TrendDirection, WeeklyReview,
};
use crate::model::thesis::Thesis;
use tr_common::Week;

use super::document::WeeklyReviewPatch;
use super::validate::PatchValidation;

/// Outcome of a patch application attempt.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The validation report, including any errors that blocked the apply.
    pub validation: PatchValidation,
    /// The reconciled review, when application succeeded (or, for a
    /// duplicate, the review the original application produced, if still
    /// retrievable).
    pub review: Option<WeeklyReview>,
    /// True iff this patch id was already applied; re-delivery of an
    /// applied patch is a no-op against state, regardless of body content.
    pub is_duplicate: bool,
}

impl PatchOutcome {
    pub(crate) fn rejected(validation: PatchValidation) -> Self {
        PatchOutcome {
            validation,
            review: None,
            is_duplicate: false,
        }
    }

    pub(crate) fn duplicate(validation: PatchValidation, review: Option<WeeklyReview>) -> Self {
        PatchOutcome {
            validation,
            review,
            is_duplicate: true,
        }
    }

    pub(crate) fn applied(validation: PatchValidation, review: WeeklyReview) -> Self {
        PatchOutcome {
            validation,
            review: Some(review),
            is_duplicate: false,
        }
    }
}

/// Build the candidate review a validated patch reconciles to, merging it
/// over any existing review for the same natural key. Derived fields are
/// normalized and recomputed before returning; the caller enforces the
/// finalize gate and the finalized-review refusal.
pub fn build_review(
    patch: &WeeklyReviewPatch,
    thesis: &Thesis,
    week: Week,
    existing: Option<&WeeklyReview>,
    now: DateTime<Utc>,
) -> WeeklyReview {
    let assumption_statuses = thesis
        .assumptions
        .iter()
        .map(|a| {
            patch
                .summary
                .assumptions_status
                .iter()
                .find(|o| o.assumption_id == a.id)
                .map(|o| AssumptionStatusEntry {
                    assumption_id: a.id.clone(),
                    health: o.status,
                    note: o.note.clone(),
                })
                .unwrap_or(AssumptionStatusEntry {
                    assumption_id: a.id.clone(),
                    health: AssumptionHealth::Intact,
                    note: None,
                })
        })
        .collect();

    let kpi_readings = thesis
        .kpis
        .iter()
        .map(|kpi| {
            patch
                .kpis
                .iter()
                .find(|obs| obs.kpi_id == kpi.id.as_str())
                .map(|obs| KpiReading {
                    kpi_id: kpi.id.clone(),
                    value: obs.current_value,
                    trend: obs.trend.unwrap_or(TrendDirection::Na),
                    delta_1w: obs.delta_1w,
                    delta_4w: obs.delta_4w,
                    comment: obs.comment.clone(),
                    status: RagStatus::Unknown,
                })
                .unwrap_or_else(|| KpiReading::empty(kpi.id.clone()))
        })
        .collect();

    let mut review = WeeklyReview {
        id: existing.map(|e| e.id.clone()).unwrap_or_default(),
        thesis_id: thesis.id.clone(),
        week,
        headline: patch.summary.headline.clone(),
        confidence: patch.summary.confidence_score,
        assumption_statuses,
        kill_criterion_statuses: existing
            .map(|e| e.kill_criterion_statuses.clone())
            .unwrap_or_default(),
        kpi_readings,
        macro_events: patch.events.macro_events.clone(),
        micro_events: patch.events.micro_events.clone(),
        decision: patch.decision.action.unwrap_or_default(),
        decision_rationale: patch.decision.rationale.clone(),
        watch_items: patch.decision.watch_items.clone(),
        overall_status: RagStatus::Unknown,
        created_at: existing.map(|e| e.created_at).unwrap_or(now),
        finalized_at: None,
        patch_id: Some(patch.patch_id.clone()),
        kill_switch_triggered: existing.map(|e| e.kill_switch_triggered).unwrap_or(false),
        notes: patch.integrity.notes.clone(),
        missing_primary_kpis: vec![],
    };

    normalize(&mut review, thesis);
    recompute(&mut review, thesis);
    review
}
