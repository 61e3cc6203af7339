//! Persistence collaborator boundary.
//!
//! The engine delegates all durable storage to a [`ReviewStore`]. Every
//! call is fallible on its own; the engine does not assume atomicity
//! across calls. [`MemoryStore`] is the reference implementation of the
//! contract and the default backing for tests.

use std::collections::BTreeMap;

use tr_common::{KpiId, Result, ReviewId, ThesisId};

use crate::model::review::WeeklyReview;
use crate::model::thesis::{KpiDefinition, Thesis};

/// Storage collaborator for theses and weekly reviews.
///
/// Implementations must tolerate stored reviews that reference a KPI id no
/// longer present on the thesis: such readings are dropped by the engine
/// on load and must never make `load_reviews` error.
pub trait ReviewStore {
    /// Load all theses with their assumptions, kill criteria, and KPI
    /// definitions.
    fn load_theses(&self) -> Result<Vec<Thesis>>;

    /// Load all weekly reviews with their child status lists and readings.
    fn load_reviews(&self) -> Result<Vec<WeeklyReview>>;

    /// Insert or fully replace a thesis and its definition rows.
    fn upsert_thesis(&mut self, thesis: &Thesis) -> Result<()>;

    /// Insert or replace a single KPI definition on a thesis.
    fn upsert_kpi(&mut self, thesis_id: &ThesisId, kpi: &KpiDefinition) -> Result<()>;

    /// Remove a KPI definition from a thesis.
    fn delete_kpi(&mut self, thesis_id: &ThesisId, kpi_id: &KpiId) -> Result<()>;

    /// Insert or replace a weekly review, fully replacing its child rows.
    fn upsert_review(&mut self, review: &WeeklyReview) -> Result<()>;

    /// Delete a thesis and cascade to its reviews.
    fn delete_thesis(&mut self, thesis_id: &ThesisId) -> Result<()>;
}

/// In-memory [`ReviewStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    theses: BTreeMap<ThesisId, Thesis>,
    reviews: BTreeMap<ReviewId, WeeklyReview>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored reviews; used by idempotence tests.
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    /// Direct read of a stored review; used by tests to check what was
    /// actually persisted.
    pub fn stored_review(&self, id: &ReviewId) -> Option<&WeeklyReview> {
        self.reviews.get(id)
    }
}

impl ReviewStore for MemoryStore {
    fn load_theses(&self) -> Result<Vec<Thesis>> {
        Ok(self.theses.values().cloned().collect())
    }

    fn load_reviews(&self) -> Result<Vec<WeeklyReview>> {
        Ok(self.reviews.values().cloned().collect())
    }

    fn upsert_thesis(&mut self, thesis: &Thesis) -> Result<()> {
        self.theses.insert(thesis.id.clone(), thesis.clone());
        Ok(())
    }

    fn upsert_kpi(&mut self, thesis_id: &ThesisId, kpi: &KpiDefinition) -> Result<()> {
        let thesis = self
            .theses
            .get_mut(thesis_id)
            .ok_or_else(|| tr_common::Error::Storage(format!("no thesis row: {thesis_id}")))?;
        match thesis.kpis.iter_mut().find(|k| k.id == kpi.id) {
            Some(slot) => *slot = kpi.clone(),
            None => thesis.kpis.push(kpi.clone()),
        }
        Ok(())
    }

    fn delete_kpi(&mut self, thesis_id: &ThesisId, kpi_id: &KpiId) -> Result<()> {
        if let Some(thesis) = self.theses.get_mut(thesis_id) {
            thesis.kpis.retain(|k| &k.id != kpi_id);
        }
        Ok(())
    }

    fn upsert_review(&mut self, review: &WeeklyReview) -> Result<()> {
        self.reviews.insert(review.id.clone(), review.clone());
        Ok(())
    }

    fn delete_thesis(&mut self, thesis_id: &ThesisId) -> Result<()> {
        self.theses.remove(thesis_id);
        self.reviews.retain(|_, r| &r.thesis_id != thesis_id);
        Ok(())
    }
}
