//! Thesis review and patch reconciliation engine.
//!
//! This crate tracks long-lived investment theses, their KPIs, assumptions,
//! and kill criteria, and reconciles externally generated weekly-review
//! patches (JSON documents) into a versioned, idempotent review history.
//!
//! The main entry point is [`ReviewEngine`], an explicit session object
//! constructed from a [`store::ReviewStore`]. All mutating operations take
//! the engine instance; there are no ambient singletons, so independent
//! sessions can coexist (e.g. in tests).
//!
//! # Data flow
//!
//! ```text
//! registry definitions ──▶ patch validator ──▶ patch applier
//!                                                  │
//!                  range classifier + status aggregator
//!                                                  │
//!                              review lifecycle (finalize/unlock)
//!                                                  │
//!                                        persistence collaborator
//! ```

pub mod aggregate;
pub mod classify;
pub mod engine;
pub mod lifecycle;
pub mod model;
pub mod patch;
pub mod query;
pub mod store;

pub use aggregate::compute_overall_status;
pub use classify::classify;
pub use engine::ReviewEngine;
pub use model::review::{
    AssumptionHealth, AssumptionStatusEntry, DecisionAction, KillCriterionState,
    KillCriterionStatusEntry, KpiReading, RagStatus, TrendDirection, WeeklyReview,
};
pub use model::thesis::{
    AssumptionDefinition, KillCriterion, KpiDefinition, KpiDirection, KpiRange, KpiRangeSet,
    Thesis, ThesisTier,
};
pub use patch::apply::PatchOutcome;
pub use patch::document::WeeklyReviewPatch;
pub use patch::validate::PatchValidation;
pub use query::KpiHistoryPoint;
pub use store::{MemoryStore, ReviewStore};
