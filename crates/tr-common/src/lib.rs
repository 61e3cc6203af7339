//! Thesis Review common types, IDs, and errors.
//!
//! This crate provides foundational types shared across tr-engine modules:
//! - Opaque identifier newtypes for theses, KPIs, reviews, and patches
//! - The ISO year+week type used as the natural key of a weekly review
//! - Common error types with stable error codes
//! - Patch schema-tag constants and the compatibility check

pub mod error;
pub mod id;
pub mod schema;
pub mod week;

pub use error::{Error, Result};
pub use id::{KpiId, PatchId, ReviewId, ThesisId};
pub use schema::PATCH_SCHEMA_TAG;
pub use week::Week;
