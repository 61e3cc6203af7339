//! Weekly-review patch ingestion.
//!
//! A patch is an externally produced JSON document describing one week's
//! observations for a thesis. It is validated against the thesis's current
//! definitions, reconciled into a [`crate::model::review::WeeklyReview`]
//! exactly once per patch id, and then discarded.

pub mod apply;
pub mod document;
pub mod validate;

use crate::model::review::WeeklyReview;
use crate::model::thesis::Thesis;
use tr_common::{ThesisId, Week};

/// Read-only view of engine state the validator and applier consult.
pub trait PatchResolver {
    /// Resolve a thesis by id.
    fn thesis(&self, id: &ThesisId) -> Option<&Thesis>;

    /// The review already stored for `(thesis_id, week)`, if any.
    fn review_for(&self, thesis_id: &ThesisId, week: Week) -> Option<&WeeklyReview>;
}
