use chrono::{DateTime, Duration, DurationRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Bucket granularity of task result statistics.
///
/// Each interval owns its own physical table; see [`StatisticInterval::table_suffix`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatisticInterval {
    Minute,
    Hour,
    Day,
}

impl StatisticInterval {
    pub const ALL: [StatisticInterval; 3] = [Self::Minute, Self::Hour, Self::Day];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
        }
    }

    /// Suffix appended to the task result table name for this interval.
    pub fn table_suffix(&self) -> &'static str {
        self.as_str()
    }

    /// Width of one bucket.
    pub fn window(&self) -> Duration {
        match self {
            Self::Minute => Duration::minutes(1),
            Self::Hour => Duration::hours(1),
            Self::Day => Duration::days(1),
        }
    }

    /// Start of the bucket containing `time`, in UTC.
    ///
    /// The repository never aligns timestamps itself; callers producing task
    /// result rows use this to pick the bucket they report against.
    pub fn align(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        time.duration_trunc(self.window()).unwrap_or(time)
    }
}

impl fmt::Display for StatisticInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatisticInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|interval| interval.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown statistic interval: {}", s)))
    }
}
