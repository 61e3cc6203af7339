//! Wire shape of weekly-review patch documents.
//!
//! Field names are normative for compatibility with externally generated
//! patches and must be preserved exactly. Optional blocks default to empty
//! so a sparse patch parses; the output review shape never depends on
//! which optional fields the input happened to include.

use serde::{Deserialize, Serialize};
use tr_common::PatchId;

use crate::model::review::{AssumptionHealth, DecisionAction, TrendDirection};

/// A fully parsed weekly-review patch document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReviewPatch {
    /// Schema tag; both the dotted and the underscored spelling are
    /// accepted (see `tr_common::schema`). Absent in some producer
    /// output, which validation reports as a warning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// External idempotence key.
    pub patch_id: PatchId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PatchMeta>,
    pub thesis_id: String,
    /// Week string, `YYYY-Www`.
    pub week: String,
    pub summary: PatchSummary,
    #[serde(default)]
    pub kpis: Vec<PatchKpiObservation>,
    #[serde(default)]
    pub events: PatchEvents,
    #[serde(default)]
    pub decision: PatchDecision,
    #[serde(default)]
    pub integrity: PatchIntegrity,
}

/// Generation metadata supplied by the patch producer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<String>,
}

/// Summary block of a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchSummary {
    #[serde(default)]
    pub headline: String,
    /// Producer's own overall-status hint. Ignored for computation; the
    /// engine always derives the overall status itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_status: Option<String>,
    pub confidence_score: i64,
    #[serde(default)]
    pub assumptions_status: Vec<PatchAssumptionStatus>,
}

/// Per-assumption status override in a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchAssumptionStatus {
    pub assumption_id: String,
    pub status: AssumptionHealth,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// One KPI observation in a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchKpiObservation {
    pub kpi_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_1w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_4w: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Events block of a patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchEvents {
    #[serde(default, rename = "macro")]
    pub macro_events: Vec<String>,
    #[serde(default, rename = "micro")]
    pub micro_events: Vec<String>,
}

/// Decision block of a patch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchDecision {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<DecisionAction>,
    #[serde(default)]
    pub rationale: Vec<String>,
    #[serde(default)]
    pub watch_items: Vec<String>,
}

/// Integrity block of a patch: the producer's own account of what it
/// could not fill in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PatchIntegrity {
    #[serde(default)]
    pub incomplete_kpis: Vec<String>,
    #[serde(default)]
    pub range_breaches: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_patch() {
        let raw = r#"{
            "patch_id": "p1",
            "thesis_id": "T1",
            "week": "2025-W01",
            "summary": {"headline": "ok", "confidence_score": 3, "assumptions_status": []},
            "kpis": [{"kpi_id": "k1", "current_value": 15}],
            "events": {},
            "decision": {"action": "Hold"},
            "integrity": {}
        }"#;
        let patch: WeeklyReviewPatch = serde_json::from_str(raw).unwrap();
        assert_eq!(patch.patch_id.as_str(), "p1");
        assert!(patch.schema.is_none());
        assert_eq!(patch.kpis.len(), 1);
        assert_eq!(patch.kpis[0].current_value, Some(15.0));
        assert_eq!(patch.decision.action, Some(DecisionAction::Hold));
        assert!(patch.events.macro_events.is_empty());
        assert!(patch.integrity.notes.is_none());
    }

    #[test]
    fn parses_full_patch() {
        let raw = r#"{
            "schema": "thesis.weekly_review.patch.v1",
            "patch_id": "p2",
            "meta": {"generated_at": "2025-01-06T09:00:00Z", "generator": "analyst"},
            "thesis_id": "T1",
            "week": "2025-W02",
            "summary": {
                "headline": "pressure building",
                "overall_status": "amber",
                "confidence_score": 2,
                "assumptions_status": [
                    {"assumption_id": "a1", "status": "stressed", "note": "churn up"}
                ]
            },
            "kpis": [
                {"kpi_id": "k1", "current_value": 22.5, "trend": "down",
                 "delta_1w": -1.5, "delta_4w": -4.0, "comment": "worsening"}
            ],
            "events": {"macro": ["rate cut"], "micro": ["CFO left"]},
            "decision": {"action": "Trim", "rationale": ["derisking"], "watch_items": ["churn"]},
            "integrity": {"incomplete_kpis": ["k2"], "range_breaches": ["k1"], "notes": "partial week"}
        }"#;
        let patch: WeeklyReviewPatch = serde_json::from_str(raw).unwrap();
        assert_eq!(patch.summary.assumptions_status[0].status, AssumptionHealth::Stressed);
        assert_eq!(patch.kpis[0].trend, Some(TrendDirection::Down));
        assert_eq!(patch.events.micro_events, vec!["CFO left"]);
        assert_eq!(patch.integrity.incomplete_kpis, vec!["k2"]);
    }

    #[test]
    fn missing_required_fields_fail_structurally() {
        let raw = r#"{"patch_id": "p1", "week": "2025-W01"}"#;
        assert!(serde_json::from_str::<WeeklyReviewPatch>(raw).is_err());
    }
}
