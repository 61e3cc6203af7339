//! Weekly review snapshots.
//!
//! A review is identified by a generated id plus its natural key
//! `(thesis_id, week)`; at most one review exists per natural key. The
//! `overall_status`, `missing_primary_kpis`, and `kill_switch_triggered`
//! fields are derived and recomputed on every mutation path
//! (see [`crate::lifecycle`]); they are carried on the struct so that
//! storage rows and JSON output stay self-describing, but they are never
//! trusted verbatim when a review is reconstructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tr_common::{KpiId, PatchId, ReviewId, ThesisId, Week};

/// Qualitative health classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    Green,
    Amber,
    Red,
    Unknown,
}

impl std::fmt::Display for RagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RagStatus::Green => "green",
            RagStatus::Amber => "amber",
            RagStatus::Red => "red",
            RagStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Health of a single assumption at review time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssumptionHealth {
    Intact,
    Stressed,
    Violated,
}

/// Status of a single kill criterion at review time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillCriterionState {
    Clear,
    Watch,
    Triggered,
}

/// Week-over-week movement of a KPI reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Flat,
    Down,
    Na,
}

impl Default for TrendDirection {
    fn default() -> Self {
        TrendDirection::Na
    }
}

/// The stated decision of a weekly review.
///
/// Serialized with capitalized variant names; external patch producers
/// emit `"Hold"`, `"Exit"`, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionAction {
    Add,
    Trim,
    Hold,
    Pause,
    Exit,
    Monitor,
}

impl Default for DecisionAction {
    fn default() -> Self {
        DecisionAction::Monitor
    }
}

/// Per-assumption judgment recorded on a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionStatusEntry {
    pub assumption_id: String,
    pub health: AssumptionHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Per-kill-criterion judgment recorded on a review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillCriterionStatusEntry {
    pub criterion_id: String,
    pub status: KillCriterionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One KPI observation within a review. `status` is derived from the KPI's
/// configured ranges, never hand-set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiReading {
    pub kpi_id: KpiId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default)]
    pub trend: TrendDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_1w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_4w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub status: RagStatus,
}

impl KpiReading {
    /// An empty reading for a KPI with no observation yet.
    pub fn empty(kpi_id: KpiId) -> Self {
        KpiReading {
            kpi_id,
            value: None,
            trend: TrendDirection::Na,
            delta_1w: None,
            delta_4w: None,
            comment: None,
            status: RagStatus::Unknown,
        }
    }
}

/// A periodic, dated snapshot of a thesis's health and the decision taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReview {
    pub id: ReviewId,
    pub thesis_id: ThesisId,
    pub week: Week,
    #[serde(default)]
    pub headline: String,
    /// Expected range 1-5. Patch ingestion enforces the bounds; in-app
    /// draft editing does not.
    pub confidence: i64,
    #[serde(default)]
    pub assumption_statuses: Vec<AssumptionStatusEntry>,
    #[serde(default)]
    pub kill_criterion_statuses: Vec<KillCriterionStatusEntry>,
    #[serde(default)]
    pub kpi_readings: Vec<KpiReading>,
    #[serde(default)]
    pub macro_events: Vec<String>,
    #[serde(default)]
    pub micro_events: Vec<String>,
    pub decision: DecisionAction,
    #[serde(default)]
    pub decision_rationale: Vec<String>,
    #[serde(default)]
    pub watch_items: Vec<String>,
    /// Derived; see module docs.
    pub overall_status: RagStatus,
    pub created_at: DateTime<Utc>,
    /// `None` while the review is a draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
    /// Idempotence key of the patch this review came from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_id: Option<PatchId>,
    /// Derived; true iff any kill criterion is triggered (or a legacy
    /// kill-switch flag survives on a thesis without criteria).
    #[serde(default)]
    pub kill_switch_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Derived; primary KPI ids still missing a value.
    #[serde(default)]
    pub missing_primary_kpis: Vec<KpiId>,
}

impl WeeklyReview {
    pub fn is_draft(&self) -> bool {
        self.finalized_at.is_none()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    pub fn reading(&self, kpi_id: &KpiId) -> Option<&KpiReading> {
        self.kpi_readings.iter().find(|r| &r.kpi_id == kpi_id)
    }

    pub fn reading_mut(&mut self, kpi_id: &KpiId) -> Option<&mut KpiReading> {
        self.kpi_readings.iter_mut().find(|r| &r.kpi_id == kpi_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_action_wire_names_are_capitalized() {
        assert_eq!(
            serde_json::to_string(&DecisionAction::Hold).unwrap(),
            "\"Hold\""
        );
        let d: DecisionAction = serde_json::from_str("\"Exit\"").unwrap();
        assert_eq!(d, DecisionAction::Exit);
    }

    #[test]
    fn rag_status_wire_names_are_snake_case() {
        assert_eq!(serde_json::to_string(&RagStatus::Amber).unwrap(), "\"amber\"");
        assert_eq!(RagStatus::Unknown.to_string(), "unknown");
    }

    #[test]
    fn empty_reading_is_unknown() {
        let r = KpiReading::empty("k1".into());
        assert_eq!(r.status, RagStatus::Unknown);
        assert!(r.value.is_none());
        assert_eq!(r.trend, TrendDirection::Na);
    }
}
