//! Property-based tests for classification totality and aggregation
//! precedence.

use proptest::prelude::*;

use chrono::Utc;
use tr_common::ReviewId;
use tr_engine::{
    classify, compute_overall_status, AssumptionHealth, AssumptionStatusEntry, KillCriterionState,
    KillCriterionStatusEntry, KpiDefinition, KpiDirection, KpiRange, KpiRangeSet, KpiReading,
    RagStatus, Thesis, ThesisTier, TrendDirection, WeeklyReview,
};

fn range_strategy() -> impl Strategy<Value = KpiRange> {
    (-1e9f64..1e9, -1e9f64..1e9).prop_map(|(a, b)| KpiRange::new(a.min(b), a.max(b)))
}

fn range_set_strategy() -> impl Strategy<Value = KpiRangeSet> {
    (range_strategy(), range_strategy(), range_strategy())
        .prop_map(|(green, amber, red)| KpiRangeSet::new(green, amber, red))
}

fn value_strategy() -> impl Strategy<Value = Option<f64>> {
    prop_oneof![
        Just(None),
        Just(Some(f64::NAN)),
        Just(Some(f64::INFINITY)),
        Just(Some(f64::NEG_INFINITY)),
        (-1e12f64..1e12).prop_map(Some),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// Classification is total: any range set and any value, including
    /// NaN, infinities, and values outside every band, yields exactly one
    /// of the four statuses.
    #[test]
    fn classify_is_total(value in value_strategy(), ranges in range_set_strategy()) {
        let status = classify(value, &ranges);
        prop_assert!(matches!(
            status,
            RagStatus::Green | RagStatus::Amber | RagStatus::Red | RagStatus::Unknown
        ));
    }

    /// A missing value is always unknown, whatever the bands.
    #[test]
    fn classify_missing_is_unknown(ranges in range_set_strategy()) {
        prop_assert_eq!(classify(None, &ranges), RagStatus::Unknown);
    }

    /// A value inside the green band is never classified red.
    #[test]
    fn classify_green_band_never_red(
        ranges in range_set_strategy(),
        frac in 0.0f64..=1.0,
    ) {
        let v = (ranges.green.lower + frac * (ranges.green.upper - ranges.green.lower))
            .clamp(ranges.green.lower, ranges.green.upper);
        prop_assert_ne!(classify(Some(v), &ranges), RagStatus::Red);
    }
}

// ── Aggregation precedence ──────────────────────────────────────────────

fn health_strategy() -> impl Strategy<Value = AssumptionHealth> {
    prop_oneof![
        Just(AssumptionHealth::Intact),
        Just(AssumptionHealth::Stressed),
        Just(AssumptionHealth::Violated),
    ]
}

fn criterion_strategy() -> impl Strategy<Value = KillCriterionState> {
    prop_oneof![
        Just(KillCriterionState::Clear),
        Just(KillCriterionState::Watch),
        Just(KillCriterionState::Triggered),
    ]
}

fn status_strategy() -> impl Strategy<Value = RagStatus> {
    prop_oneof![
        Just(RagStatus::Green),
        Just(RagStatus::Amber),
        Just(RagStatus::Red),
        Just(RagStatus::Unknown),
    ]
}

fn kpi(id: &str, primary: bool) -> KpiDefinition {
    KpiDefinition {
        id: id.into(),
        name: id.to_string(),
        unit: String::new(),
        description: String::new(),
        source: String::new(),
        is_primary: primary,
        direction: KpiDirection::HigherIsBetter,
        ranges: KpiRangeSet::new(
            KpiRange::new(0.0, 1.0),
            KpiRange::new(1.0, 2.0),
            KpiRange::new(2.0, 3.0),
        ),
    }
}

fn fixture(
    assumptions: Vec<AssumptionHealth>,
    criteria: Vec<KillCriterionState>,
    primary: Vec<RagStatus>,
    secondary: Vec<RagStatus>,
) -> (WeeklyReview, Thesis) {
    let thesis = Thesis {
        id: "t".into(),
        name: "t".to_string(),
        north_star: String::new(),
        role: String::new(),
        non_goals: String::new(),
        tier: ThesisTier::Tier2,
        assumptions: vec![],
        kill_criteria: vec![],
        kpis: primary
            .iter()
            .enumerate()
            .map(|(i, _)| kpi(&format!("p{i}"), true))
            .chain(
                secondary
                    .iter()
                    .enumerate()
                    .map(|(i, _)| kpi(&format!("s{i}"), false)),
            )
            .collect(),
    };
    let review = WeeklyReview {
        id: ReviewId::new(),
        thesis_id: "t".into(),
        week: "2025-W01".parse().unwrap(),
        headline: String::new(),
        confidence: 3,
        assumption_statuses: assumptions
            .into_iter()
            .enumerate()
            .map(|(i, health)| AssumptionStatusEntry {
                assumption_id: format!("a{i}"),
                health,
                note: None,
            })
            .collect(),
        kill_criterion_statuses: criteria
            .into_iter()
            .enumerate()
            .map(|(i, status)| KillCriterionStatusEntry {
                criterion_id: format!("c{i}"),
                status,
                note: None,
            })
            .collect(),
        kpi_readings: primary
            .iter()
            .enumerate()
            .map(|(i, status)| (format!("p{i}"), *status))
            .chain(
                secondary
                    .iter()
                    .enumerate()
                    .map(|(i, status)| (format!("s{i}"), *status)),
            )
            .map(|(id, status)| KpiReading {
                kpi_id: id.as_str().into(),
                value: Some(0.5),
                trend: TrendDirection::Flat,
                delta_1w: None,
                delta_4w: None,
                comment: None,
                status,
            })
            .collect(),
        macro_events: vec![],
        micro_events: vec![],
        decision: Default::default(),
        decision_rationale: vec![],
        watch_items: vec![],
        overall_status: RagStatus::Unknown,
        created_at: Utc::now(),
        finalized_at: None,
        patch_id: None,
        kill_switch_triggered: false,
        notes: None,
        missing_primary_kpis: vec![],
    };
    (review, thesis)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    /// A triggered kill criterion forces red no matter what else says.
    #[test]
    fn triggered_criterion_dominates(
        assumptions in prop::collection::vec(health_strategy(), 0..4),
        criteria in prop::collection::vec(criterion_strategy(), 0..3),
        primary in prop::collection::vec(status_strategy(), 0..5),
        secondary in prop::collection::vec(status_strategy(), 0..4),
    ) {
        let mut criteria = criteria;
        criteria.push(KillCriterionState::Triggered);
        let (review, thesis) = fixture(assumptions, criteria, primary, secondary);
        prop_assert_eq!(compute_overall_status(&review, &thesis), RagStatus::Red);
    }

    /// A violated assumption forces red no matter the KPIs.
    #[test]
    fn violated_assumption_dominates_kpis(
        assumptions in prop::collection::vec(health_strategy(), 0..4),
        primary in prop::collection::vec(status_strategy(), 0..5),
        secondary in prop::collection::vec(status_strategy(), 0..4),
    ) {
        let mut assumptions = assumptions;
        assumptions.push(AssumptionHealth::Violated);
        let (review, thesis) = fixture(assumptions, vec![], primary, secondary);
        prop_assert_eq!(compute_overall_status(&review, &thesis), RagStatus::Red);
    }

    /// Secondary KPIs never affect the overall status: dropping all of
    /// them leaves the aggregate unchanged.
    #[test]
    fn secondary_kpis_are_inert(
        assumptions in prop::collection::vec(health_strategy(), 0..4),
        criteria in prop::collection::vec(criterion_strategy(), 0..3),
        primary in prop::collection::vec(status_strategy(), 0..5),
        secondary in prop::collection::vec(status_strategy(), 0..4),
    ) {
        let (with_sec, thesis) = fixture(
            assumptions.clone(), criteria.clone(), primary.clone(), secondary,
        );
        let (without_sec, thesis_bare) = fixture(assumptions, criteria, primary, vec![]);
        prop_assert_eq!(
            compute_overall_status(&with_sec, &thesis),
            compute_overall_status(&without_sec, &thesis_bare)
        );
    }

    /// The aggregate is always one of green/amber/red (never unknown):
    /// aggregation has a defined floor of green.
    #[test]
    fn aggregate_is_total_over_gar(
        assumptions in prop::collection::vec(health_strategy(), 0..4),
        criteria in prop::collection::vec(criterion_strategy(), 0..3),
        primary in prop::collection::vec(status_strategy(), 0..5),
        secondary in prop::collection::vec(status_strategy(), 0..4),
    ) {
        let (review, thesis) = fixture(assumptions, criteria, primary, secondary);
        let overall = compute_overall_status(&review, &thesis);
        prop_assert!(matches!(
            overall,
            RagStatus::Green | RagStatus::Amber | RagStatus::Red
        ));
    }
}

#[test]
fn amber_primary_with_all_clear_context_is_amber() {
    let (review, thesis) = fixture(
        vec![AssumptionHealth::Intact],
        vec![KillCriterionState::Clear],
        vec![RagStatus::Amber, RagStatus::Green],
        vec![],
    );
    assert_eq!(compute_overall_status(&review, &thesis), RagStatus::Amber);
}

#[test]
fn amber_secondary_alone_is_green() {
    let (review, thesis) = fixture(
        vec![AssumptionHealth::Intact],
        vec![KillCriterionState::Clear],
        vec![RagStatus::Green],
        vec![RagStatus::Amber],
    );
    assert_eq!(compute_overall_status(&review, &thesis), RagStatus::Green);
}
