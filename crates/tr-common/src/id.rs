//! Thesis, KPI, review, and patch identity types.
//!
//! All ids are opaque strings supplied by the caller (theses, KPIs) or an
//! external patch producer (patches); review ids are generated locally.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Opaque identifier of a thesis.
    ThesisId
}

string_id! {
    /// Identifier of a KPI definition, unique within its owning thesis.
    KpiId
}

string_id! {
    /// External idempotence key of a weekly-review patch.
    PatchId
}

/// Identifier of a weekly review.
///
/// Format: `rev-<date>-<time>-<random>`
/// Example: `rev-20260103-101500-a1b2c3`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub String);

impl ReviewId {
    /// Generate a new review ID.
    pub fn new() -> Self {
        let now = chrono::Utc::now();
        let random: String = uuid::Uuid::new_v4().to_string().chars().take(6).collect();
        ReviewId(format!("rev-{}-{}", now.format("%Y%m%d-%H%M%S"), random))
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReviewId {
    fn from(s: &str) -> Self {
        ReviewId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_id_format() {
        let rid = ReviewId::new();
        assert!(rid.0.starts_with("rev-"));
        assert!(rid.0.len() > 20);
    }

    #[test]
    fn test_review_ids_are_unique() {
        assert_ne!(ReviewId::new(), ReviewId::new());
    }

    #[test]
    fn test_string_id_roundtrip() {
        let tid: ThesisId = "T1".into();
        assert_eq!(tid.as_str(), "T1");
        assert_eq!(tid.to_string(), "T1");
    }
}
