//! ISO year+week identifier.
//!
//! A `Week` is the natural key of a weekly review together with its thesis
//! id. The wire format is `YYYY-Www` (e.g. `2025-W01`), matching the week
//! strings emitted by external patch producers.

use chrono::{NaiveDate, Weekday};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{Error, Result};

/// ISO year + week number, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Week {
    year: i32,
    week: u32,
}

fn week_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-W(\d{2})$").expect("static regex"))
}

impl Week {
    /// Construct a week, validating that the week number exists in the
    /// given ISO year (most years have 52 weeks, some 53).
    pub fn new(year: i32, week: u32) -> Result<Self> {
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(Error::InvalidWeek(format!(
                "week {week:02} does not exist in ISO year {year}"
            )));
        }
        Ok(Week { year, week })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this ISO week.
    pub fn start_date(&self) -> NaiveDate {
        // Validated at construction, so the lookup cannot fail.
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).unwrap())
    }

}

impl FromStr for Week {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = week_pattern()
            .captures(s)
            .ok_or_else(|| Error::InvalidWeek(format!("expected YYYY-Www, got {s:?}")))?;
        let year: i32 = caps[1]
            .parse()
            .map_err(|_| Error::InvalidWeek(format!("bad year in {s:?}")))?;
        let week: u32 = caps[2]
            .parse()
            .map_err(|_| Error::InvalidWeek(format!("bad week number in {s:?}")))?;
        Week::new(year, week)
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl Serialize for Week {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Week {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
