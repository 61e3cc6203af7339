//! Thesis definitions: KPIs, assumptions, and kill criteria.
//!
//! A thesis owns its definitions by value; KPI ids are unique within a
//! thesis and the KPI lists are hard-capped (5 primary, 4 secondary,
//! 9 combined).

use serde::{Deserialize, Serialize};
use tr_common::{Error, KpiId, Result, ThesisId};

/// Maximum number of primary KPIs per thesis.
pub const MAX_PRIMARY_KPIS: usize = 5;

/// Maximum number of secondary KPIs per thesis.
pub const MAX_SECONDARY_KPIS: usize = 4;

/// Maximum combined number of KPIs per thesis.
pub const MAX_TOTAL_KPIS: usize = 9;

/// Conviction tier of a thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisTier {
    Tier1,
    Tier2,
}

/// Informational direction of a KPI. Classification itself is range-driven,
/// not direction-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiDirection {
    HigherIsBetter,
    LowerIsBetter,
}

/// Inclusive numeric band `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiRange {
    pub lower: f64,
    pub upper: f64,
}

impl KpiRange {
    pub fn new(lower: f64, upper: f64) -> Self {
        KpiRange { lower, upper }
    }

    /// Inclusive containment on both ends.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// The green/amber/red bands of a KPI. Disjoint by convention, not
/// enforced; classification checks green, then amber, then red.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiRangeSet {
    pub green: KpiRange,
    pub amber: KpiRange,
    pub red: KpiRange,
}

impl KpiRangeSet {
    pub fn new(green: KpiRange, amber: KpiRange, red: KpiRange) -> Self {
        KpiRangeSet { green, amber, red }
    }
}

/// A single KPI definition owned by a thesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiDefinition {
    pub id: KpiId,
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub description: String,
    /// Where the reading comes from (e.g. "quarterly report", "IR deck").
    #[serde(default)]
    pub source: String,
    pub is_primary: bool,
    pub direction: KpiDirection,
    pub ranges: KpiRangeSet,
}

/// A qualitative assumption underpinning a thesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssumptionDefinition {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

/// A binary invalidation condition. If triggered, the thesis is considered
/// broken regardless of KPI readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KillCriterion {
    pub id: String,
    pub description: String,
}

/// A long-lived investment thesis and everything it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    pub id: ThesisId,
    pub name: String,
    /// Long-form narrative of what this thesis is really about.
    #[serde(default)]
    pub north_star: String,
    /// Role the position plays in the portfolio (e.g. "compounder").
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub non_goals: String,
    pub tier: ThesisTier,
    #[serde(default)]
    pub assumptions: Vec<AssumptionDefinition>,
    #[serde(default)]
    pub kill_criteria: Vec<KillCriterion>,
    #[serde(default)]
    pub kpis: Vec<KpiDefinition>,
}

impl Thesis {
    pub fn kpi(&self, id: &KpiId) -> Option<&KpiDefinition> {
        self.kpis.iter().find(|k| &k.id == id)
    }

    pub fn primary_kpis(&self) -> impl Iterator<Item = &KpiDefinition> {
        self.kpis.iter().filter(|k| k.is_primary)
    }

    pub fn secondary_kpis(&self) -> impl Iterator<Item = &KpiDefinition> {
        self.kpis.iter().filter(|k| !k.is_primary)
    }

    /// Check that one more KPI fits in the given slot. `exclude` names a
    /// KPI whose current slot should not count against the caps (used when
    /// moving a KPI between lists or editing it in place).
    pub fn check_kpi_capacity(&self, is_primary: bool, exclude: Option<&KpiId>) -> Result<()> {
        let counted = |k: &&KpiDefinition| Some(&k.id) != exclude;
        let total = self.kpis.iter().filter(counted).count();
        if total >= MAX_TOTAL_KPIS {
            return Err(Error::KpiCapExceeded {
                slot: "combined",
                cap: MAX_TOTAL_KPIS,
            });
        }
        if is_primary {
            let primaries = self.primary_kpis().filter(counted).count();
            if primaries >= MAX_PRIMARY_KPIS {
                return Err(Error::KpiCapExceeded {
                    slot: "primary",
                    cap: MAX_PRIMARY_KPIS,
                });
            }
        } else {
            let secondaries = self.secondary_kpis().filter(counted).count();
            if secondaries >= MAX_SECONDARY_KPIS {
                return Err(Error::KpiCapExceeded {
                    slot: "secondary",
                    cap: MAX_SECONDARY_KPIS,
                });
            }
        }
        Ok(())
    }

    /// Check the whole KPI list against the caps and the unique-id
    /// invariant. Used when a thesis arrives fully formed (create/update
    /// by full replacement, load from storage).
    pub fn validate_kpi_lists(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for kpi in &self.kpis {
            if !seen.insert(&kpi.id) {
                return Err(Error::DuplicateKpiId {
                    kpi_id: kpi.id.to_string(),
                });
            }
        }
        if self.kpis.len() > MAX_TOTAL_KPIS {
            return Err(Error::KpiCapExceeded {
                slot: "combined",
                cap: MAX_TOTAL_KPIS,
            });
        }
        if self.primary_kpis().count() > MAX_PRIMARY_KPIS {
            return Err(Error::KpiCapExceeded {
                slot: "primary",
                cap: MAX_PRIMARY_KPIS,
            });
        }
        if self.secondary_kpis().count() > MAX_SECONDARY_KPIS {
            return Err(Error::KpiCapExceeded {
                slot: "secondary",
                cap: MAX_SECONDARY_KPIS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kpi(id: &str, primary: bool) -> KpiDefinition {
        KpiDefinition {
            id: id.into(),
            name: id.to_uppercase(),
            unit: "%".to_string(),
            description: String::new(),
            source: String::new(),
            is_primary: primary,
            direction: KpiDirection::HigherIsBetter,
            ranges: KpiRangeSet::new(
                KpiRange::new(0.0, 10.0),
                KpiRange::new(10.0, 20.0),
                KpiRange::new(20.0, 100.0),
            ),
        }
    }

    fn thesis_with(kpis: Vec<KpiDefinition>) -> Thesis {
        Thesis {
            id: "t1".into(),
            name: "Test".to_string(),
            north_star: String::new(),
            role: String::new(),
            non_goals: String::new(),
            tier: ThesisTier::Tier1,
            assumptions: vec![],
            kill_criteria: vec![],
            kpis,
        }
    }

    #[test]
    fn range_containment_is_inclusive() {
        let r = KpiRange::new(0.0, 10.0);
        assert!(r.contains(0.0));
        assert!(r.contains(10.0));
        assert!(!r.contains(10.000001));
        assert!(!r.contains(-0.000001));
    }

    #[test]
    fn primary_cap_is_five() {
        let t = thesis_with((0..5).map(|i| kpi(&format!("p{i}"), true)).collect());
        assert!(matches!(
            t.check_kpi_capacity(true, None),
            Err(Error::KpiCapExceeded {
                slot: "primary",
                cap: 5
            })
        ));
        // A sixth secondary KPI still fits.
        assert!(t.check_kpi_capacity(false, None).is_ok());
    }

    #[test]
    fn secondary_cap_is_four() {
        let t = thesis_with((0..4).map(|i| kpi(&format!("s{i}"), false)).collect());
        assert!(matches!(
            t.check_kpi_capacity(false, None),
            Err(Error::KpiCapExceeded {
                slot: "secondary",
                cap: 4
            })
        ));
    }

    #[test]
    fn total_cap_is_nine() {
        let mut kpis: Vec<_> = (0..5).map(|i| kpi(&format!("p{i}"), true)).collect();
        kpis.extend((0..4).map(|i| kpi(&format!("s{i}"), false)));
        let t = thesis_with(kpis);
        assert!(t.validate_kpi_lists().is_ok());
        assert!(matches!(
            t.check_kpi_capacity(false, None),
            Err(Error::KpiCapExceeded {
                slot: "combined",
                cap: 9
            })
        ));
    }

    #[test]
    fn move_excludes_self_from_counts() {
        let mut kpis: Vec<_> = (0..4).map(|i| kpi(&format!("p{i}"), true)).collect();
        kpis.push(kpi("s0", false));
        let t = thesis_with(kpis);
        // Moving s0 to primary: 4 existing primaries, fits.
        assert!(t.check_kpi_capacity(true, Some(&"s0".into())).is_ok());
        // Editing p0 in place keeps fitting.
        assert!(t.check_kpi_capacity(true, Some(&"p0".into())).is_ok());
    }

    #[test]
    fn duplicate_kpi_ids_rejected() {
        let t = thesis_with(vec![kpi("k1", true), kpi("k1", false)]);
        assert!(matches!(
            t.validate_kpi_lists(),
            Err(Error::DuplicateKpiId { .. })
        ));
    }
}
