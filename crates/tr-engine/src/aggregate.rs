//! Overall status aggregation.
//!
//! Kill criteria and violated assumptions are existential threats to a
//! thesis and must dominate any KPI noise, so they outrank KPI-derived
//! statuses in the precedence order. Secondary KPIs never affect the
//! overall status.

use std::collections::HashSet;

use crate::model::review::{
    AssumptionHealth, KillCriterionState, RagStatus, WeeklyReview,
};
use crate::model::thesis::Thesis;

/// Combine kill-criteria, assumption, and primary-KPI statuses into one
/// overall status. Precedence, first match wins:
///
/// 1. any triggered kill criterion, or the legacy kill-switch flag → red
/// 2. any violated assumption → red
/// 3. any red primary KPI reading → red
/// 4. any stressed assumption → amber
/// 5. any amber primary KPI reading → amber
/// 6. otherwise → green
pub fn compute_overall_status(review: &WeeklyReview, thesis: &Thesis) -> RagStatus {
    let any_triggered = review
        .kill_criterion_statuses
        .iter()
        .any(|e| e.status == KillCriterionState::Triggered);
    if any_triggered || review.kill_switch_triggered {
        return RagStatus::Red;
    }

    if review
        .assumption_statuses
        .iter()
        .any(|e| e.health == AssumptionHealth::Violated)
    {
        return RagStatus::Red;
    }

    let primary_ids: HashSet<_> = thesis.primary_kpis().map(|k| &k.id).collect();
    let primary_has = |status: RagStatus| {
        review
            .kpi_readings
            .iter()
            .any(|r| r.status == status && primary_ids.contains(&r.kpi_id))
    };

    if primary_has(RagStatus::Red) {
        return RagStatus::Red;
    }

    if review
        .assumption_statuses
        .iter()
        .any(|e| e.health == AssumptionHealth::Stressed)
    {
        return RagStatus::Amber;
    }

    if primary_has(RagStatus::Amber) {
        return RagStatus::Amber;
    }

    RagStatus::Green
}
