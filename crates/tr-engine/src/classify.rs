//! Range classification of KPI readings.

use crate::model::review::RagStatus;
use crate::model::thesis::KpiRangeSet;

/// Map a KPI reading against its configured bands.
///
/// Missing value yields `Unknown`. Containment is inclusive on both ends,
/// checked green, then amber, then red. A value outside every configured
/// band (misconfigured bands with gaps) yields `Unknown` rather than
/// failing. Total for every input, including NaN.
pub fn classify(value: Option<f64>, ranges: &KpiRangeSet) -> RagStatus {
    let Some(v) = value else {
        return RagStatus::Unknown;
    };
    if ranges.green.contains(v) {
        RagStatus::Green
    } else if ranges.amber.contains(v) {
        RagStatus::Amber
    } else if ranges.red.contains(v) {
        RagStatus::Red
    } else {
        RagStatus::Unknown
    }
}
