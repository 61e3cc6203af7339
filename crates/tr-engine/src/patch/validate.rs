//! Patch validation.
//!
//! Validation is pure with respect to engine state: it parses a raw JSON
//! document and checks it semantically against the thesis's current
//! definitions without mutating anything. Findings are returned as a
//! structured report, never raised as control flow, so a caller can render
//! every error and warning to a human reviewer at once.

use std::collections::HashSet;

use tr_common::schema::is_accepted_patch_schema;
use tr_common::{ThesisId, Week};

use super::document::WeeklyReviewPatch;
use super::PatchResolver;

/// Lowest accepted confidence score.
pub const MIN_CONFIDENCE: i64 = 1;

/// Highest accepted confidence score.
pub const MAX_CONFIDENCE: i64 = 5;

/// Structured validation report for a raw patch document.
#[derive(Debug, Clone, Default)]
pub struct PatchValidation {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Human-readable preview of what applying the patch would do.
    pub diff: Vec<String>,
    /// The parsed document, when structural parsing succeeded.
    pub patch: Option<WeeklyReviewPatch>,
}

impl PatchValidation {
    /// A patch is valid iff it parsed and no errors were recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.patch.is_some()
    }

    pub(crate) fn structural_failure(message: String) -> Self {
        PatchValidation {
            errors: vec![message],
            ..Default::default()
        }
    }
}

/// Validate a raw patch document against current definitions.
pub fn validate<R: PatchResolver>(raw: &str, resolver: &R) -> PatchValidation {
    let patch: WeeklyReviewPatch = match serde_json::from_str(raw) {
        Ok(p) => p,
        Err(e) => {
            return PatchValidation::structural_failure(format!(
                "failed to parse patch JSON: {e}"
            ));
        }
    };

    let mut report = PatchValidation {
        patch: Some(patch.clone()),
        ..Default::default()
    };

    match &patch.schema {
        None => report
            .warnings
            .push("patch carries no schema tag; assuming the current patch schema".to_string()),
        Some(tag) if !is_accepted_patch_schema(tag) => report
            .errors
            .push(format!("unsupported patch schema tag: {tag:?}")),
        Some(_) => {}
    }

    let thesis_id = ThesisId::from(patch.thesis_id.as_str());
    let Some(thesis) = resolver.thesis(&thesis_id) else {
        // Terminal: nothing further can be checked without definitions.
        report
            .errors
            .push(format!("unknown thesis id: {}", patch.thesis_id));
        return report;
    };

    let week: Week = match patch.week.parse() {
        Ok(w) => w,
        Err(e) => {
            // Terminal: the natural key cannot be formed.
            report.errors.push(e.to_string());
            return report;
        }
    };

    let confidence = patch.summary.confidence_score;
    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&confidence) {
        report.errors.push(format!(
            "confidence_score {confidence} out of range {MIN_CONFIDENCE}..{MAX_CONFIDENCE}"
        ));
    }

    let mut seen = HashSet::new();
    let unknown_kpis: Vec<&str> = patch
        .kpis
        .iter()
        .map(|obs| obs.kpi_id.as_str())
        .filter(|id| thesis.kpi(&(*id).into()).is_none() && seen.insert(*id))
        .collect();
    if !unknown_kpis.is_empty() {
        report.errors.push(format!(
            "unknown KPI ids on thesis {}: {}",
            thesis.id,
            unknown_kpis.join(", ")
        ));
    }

    let primary_ids: HashSet<&str> = thesis.primary_kpis().map(|k| k.id.as_str()).collect();
    let supplies_primary = patch
        .kpis
        .iter()
        .any(|obs| primary_ids.contains(obs.kpi_id.as_str()));
    if !primary_ids.is_empty() && !supplies_primary {
        // Advisory only; finalization is the hard gate.
        report.warnings.push(format!(
            "patch supplies none of the {} primary KPIs of thesis {}",
            primary_ids.len(),
            thesis.id
        ));
    }

    match resolver.review_for(&thesis_id, week) {
        Some(existing) => {
            report.diff.push(format!("Update WeeklyReview: {week}"));
            if existing.headline != patch.summary.headline {
                report.diff.push(format!(
                    "headline: {:?} -> {:?}",
                    existing.headline, patch.summary.headline
                ));
            }
        }
        None => report.diff.push(format!("Create WeeklyReview: {week}")),
    }

    report
}
