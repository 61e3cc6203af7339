//! Error types for Thesis Review.

use thiserror::Error;

/// Result type alias for Thesis Review operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for Thesis Review.
#[derive(Error, Debug)]
pub enum Error {
    // Registry errors (10-19)
    #[error("thesis not found: {thesis_id}")]
    ThesisNotFound { thesis_id: String },

    #[error("KPI not found on thesis {thesis_id}: {kpi_id}")]
    KpiNotFound { thesis_id: String, kpi_id: String },

    #[error("KPI cap exceeded: {slot} list is full (cap {cap})")]
    KpiCapExceeded { slot: &'static str, cap: usize },

    #[error("duplicate KPI id on thesis: {kpi_id}")]
    DuplicateKpiId { kpi_id: String },

    // Review lifecycle errors (20-29)
    #[error("review {review_id} for week {week} is finalized; unlock it before editing")]
    ReviewAlreadyFinalized { review_id: String, week: String },

    #[error("cannot finalize: missing values for primary KPIs: {}", missing.join(", "))]
    PrimaryKpiIncomplete { missing: Vec<String> },

    // Patch errors (30-39)
    #[error("invalid patch: {0}")]
    InvalidPatch(String),

    #[error("invalid week identifier: {0}")]
    InvalidWeek(String),

    // Storage errors (40-49)
    #[error("storage error: {0}")]
    Storage(String),

    // I/O errors (60-69)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::ThesisNotFound { .. } => 10,
            Error::KpiNotFound { .. } => 11,
            Error::KpiCapExceeded { .. } => 12,
            Error::DuplicateKpiId { .. } => 13,
            Error::ReviewAlreadyFinalized { .. } => 20,
            Error::PrimaryKpiIncomplete { .. } => 21,
            Error::InvalidPatch(_) => 30,
            Error::InvalidWeek(_) => 31,
            Error::Storage(_) => 40,
            Error::Json(_) => 61,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incomplete_finalize_names_every_missing_kpi() {
        let err = Error::PrimaryKpiIncomplete {
            missing: vec!["k1".to_string(), "k3".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("k1"));
        assert!(msg.contains("k3"));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            Error::ThesisNotFound {
                thesis_id: "t".into()
            }
            .code(),
            10
        );
        assert_eq!(Error::InvalidPatch("x".into()).code(), 30);
    }
}
