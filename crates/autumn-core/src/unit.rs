//! Time-axis granularity selection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::duration::{MS_PER_DAY, duration_ms};

/// Up to this many days the axis ticks per day.
const MAX_DAYS_FOR_DAY: i64 = 21;
/// Up to this many days the axis ticks per week.
const MAX_DAYS_FOR_WEEK: i64 = 90;
/// Up to this many calendar months the axis ticks per month.
const MAX_MONTHS_FOR_MONTH: i32 = 18;

/// Display granularity for a time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Day,
    Week,
    Month,
    Year,
}

impl TimeUnit {
    /// Chooses a unit for the range `[range_start, range_end]`.
    ///
    /// Day count is the rounded number of 24h periods; month count is
    /// calendar arithmetic on year/month so uneven month lengths don't drift.
    pub fn choose<Tz: TimeZone>(range_end: &DateTime<Tz>, range_start: &DateTime<Tz>) -> Self {
        #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
        let days = (duration_ms(range_start, range_end) as f64 / MS_PER_DAY as f64).round() as i64;
        let months = month_difference(
            range_end.year(),
            range_end.month(),
            range_start.year(),
            range_start.month(),
        );
        Self::from_differences(days, months)
    }

    /// Same decision table over calendar dates.
    pub fn for_dates(range_end: NaiveDate, range_start: NaiveDate) -> Self {
        let days = (range_end - range_start).num_days();
        let months = month_difference(
            range_end.year(),
            range_end.month(),
            range_start.year(),
            range_start.month(),
        );
        Self::from_differences(days, months)
    }

    const fn from_differences(days: i64, months: i32) -> Self {
        if days <= MAX_DAYS_FOR_DAY {
            Self::Day
        } else if days <= MAX_DAYS_FOR_WEEK {
            Self::Week
        } else if months <= MAX_MONTHS_FOR_MONTH {
            Self::Month
        } else {
            Self::Year
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

/// Chooses a unit for the range `[range_start, range_end]`.
pub fn choose_unit<Tz: TimeZone>(range_end: &DateTime<Tz>, range_start: &DateTime<Tz>) -> TimeUnit {
    TimeUnit::choose(range_end, range_start)
}

#[allow(clippy::cast_possible_wrap)]
const fn month_difference(end_year: i32, end_month: u32, start_year: i32, start_month: u32) -> i32 {
    (end_year - start_year) * 12 + end_month as i32 - start_month as i32
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = UnknownTimeUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(UnknownTimeUnit(s.to_string())),
        }
    }
}

/// Error type for unknown time unit strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time unit: {0}")]
pub struct UnknownTimeUnit(String);
