//! Review lifecycle: draft seeding, normalization, and derived-state
//! recomputation.
//!
//! # State machine
//!
//! ```text
//! Draft ──finalize──▶ Finalized ──unlock──▶ Draft
//! ```
//!
//! `finalized_at = None` means draft. No other transitions exist; the
//! finalize gate and the unlock operation themselves live on
//! [`crate::engine::ReviewEngine`], which owns persistence. The functions
//! here are pure with respect to engine state and operate on a review in
//! place.
//!
//! Normalization reconciles a review's status lists against the thesis's
//! *current* definitions: entries for assumptions/criteria no longer on
//! the thesis are dropped, entries for new ones are added with safe
//! defaults, and readings for removed KPIs are pruned (a dangling KPI
//! reference is never left orphaned).

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::aggregate::compute_overall_status;
use crate::classify::classify;
use crate::model::review::{
    AssumptionHealth, AssumptionStatusEntry, KillCriterionState, KillCriterionStatusEntry,
    KpiReading, RagStatus, WeeklyReview,
};
use crate::model::thesis::Thesis;
use tr_common::{ReviewId, Week};

/// Note attached to a kill-criterion entry synthesized from a legacy
/// boolean kill-switch flag.
pub const LEGACY_KILL_SWITCH_NOTE: &str =
    "derived from legacy kill-switch flag; originally triggered criterion unknown";

/// Seed a fresh draft from the thesis's current definitions: every
/// assumption `intact`, every kill criterion `clear`, every KPI with an
/// empty reading.
pub fn seed_draft(thesis: &Thesis, week: Week, now: DateTime<Utc>) -> WeeklyReview {
    let mut review = WeeklyReview {
        id: ReviewId::new(),
        thesis_id: thesis.id.clone(),
        week,
        headline: String::new(),
        confidence: 3,
        assumption_statuses: thesis
            .assumptions
            .iter()
            .map(|a| AssumptionStatusEntry {
                assumption_id: a.id.clone(),
                health: AssumptionHealth::Intact,
                note: None,
            })
            .collect(),
        kill_criterion_statuses: thesis
            .kill_criteria
            .iter()
            .map(|c| KillCriterionStatusEntry {
                criterion_id: c.id.clone(),
                status: KillCriterionState::Clear,
                note: None,
            })
            .collect(),
        kpi_readings: thesis
            .kpis
            .iter()
            .map(|k| KpiReading::empty(k.id.clone()))
            .collect(),
        macro_events: vec![],
        micro_events: vec![],
        decision: Default::default(),
        decision_rationale: vec![],
        watch_items: vec![],
        overall_status: RagStatus::Unknown,
        created_at: now,
        finalized_at: None,
        patch_id: None,
        kill_switch_triggered: false,
        notes: None,
        missing_primary_kpis: vec![],
    };
    recompute(&mut review, thesis);
    review
}

/// Reconcile a review's child lists against the thesis's current
/// definitions. Applied on every load, draft start, and save.
pub fn normalize(review: &mut WeeklyReview, thesis: &Thesis) {
    // A legacy review may carry only the boolean flag with no per-criterion
    // detail. Synthesize exactly one triggered entry on the first criterion
    // so the aggregator's criterion scan still fires; which criterion was
    // actually triggered is unrecoverable from the flag alone.
    let legacy_flag = review.kill_switch_triggered
        && !review
            .kill_criterion_statuses
            .iter()
            .any(|e| e.status == KillCriterionState::Triggered);

    review.assumption_statuses = thesis
        .assumptions
        .iter()
        .map(|a| {
            review
                .assumption_statuses
                .iter()
                .find(|e| e.assumption_id == a.id)
                .cloned()
                .unwrap_or(AssumptionStatusEntry {
                    assumption_id: a.id.clone(),
                    health: AssumptionHealth::Intact,
                    note: None,
                })
        })
        .collect();

    review.kill_criterion_statuses = thesis
        .kill_criteria
        .iter()
        .map(|c| {
            review
                .kill_criterion_statuses
                .iter()
                .find(|e| e.criterion_id == c.id)
                .cloned()
                .unwrap_or(KillCriterionStatusEntry {
                    criterion_id: c.id.clone(),
                    status: KillCriterionState::Clear,
                    note: None,
                })
        })
        .collect();

    if legacy_flag {
        if let Some(first) = review.kill_criterion_statuses.first_mut() {
            warn!(
                review_id = %review.id,
                criterion_id = %first.criterion_id,
                "translating legacy kill-switch flag into a triggered criterion entry"
            );
            first.status = KillCriterionState::Triggered;
            first.note = Some(LEGACY_KILL_SWITCH_NOTE.to_string());
        }
        // No criteria on the thesis: the bare flag survives and still
        // forces red through the aggregator.
    }

    let before = review.kpi_readings.len();
    review
        .kpi_readings
        .retain(|r| thesis.kpi(&r.kpi_id).is_some());
    let dropped = before - review.kpi_readings.len();
    if dropped > 0 {
        debug!(review_id = %review.id, dropped, "pruned readings for removed KPIs");
    }
    for kpi in &thesis.kpis {
        if review.reading(&kpi.id).is_none() {
            review.kpi_readings.push(KpiReading::empty(kpi.id.clone()));
        }
    }
}

/// Recompute every derived field: per-reading RAG status, the missing
/// primary-KPI list, the kill-switch flag, and the overall status. Ranges
/// are read from the thesis at call time, never cached against a stale
/// reading.
pub fn recompute(review: &mut WeeklyReview, thesis: &Thesis) {
    for reading in &mut review.kpi_readings {
        if let Some(kpi) = thesis.kpi(&reading.kpi_id) {
            reading.status = classify(reading.value, &kpi.ranges);
        } else {
            reading.status = RagStatus::Unknown;
        }
    }

    review.missing_primary_kpis = thesis
        .primary_kpis()
        .filter(|k| review.reading(&k.id).map_or(true, |r| r.value.is_none()))
        .map(|k| k.id.clone())
        .collect();

    let any_triggered = review
        .kill_criterion_statuses
        .iter()
        .any(|e| e.status == KillCriterionState::Triggered);
    // Keep a bare legacy flag alive only when the thesis has no criteria
    // to pin it on; otherwise the flag mirrors the criterion scan.
    review.kill_switch_triggered =
        any_triggered || (review.kill_switch_triggered && thesis.kill_criteria.is_empty());

    review.overall_status = compute_overall_status(review, thesis);
}
