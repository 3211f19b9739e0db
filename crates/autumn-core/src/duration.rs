//! Interval duration math.
//!
//! Aggregators accumulate whole milliseconds and only convert to hours when
//! building their output, so splitting a session into blocks never loses time.

use chrono::{DateTime, TimeZone};

/// Milliseconds in one hour.
pub const MS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds in one day (fixed 24h, used for range length only).
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Exact length of `[start, end)` in milliseconds.
///
/// Negative when `end < start`; callers treat that as a data-quality error.
pub fn duration_ms<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> i64 {
    (end.clone() - start.clone()).num_milliseconds()
}

/// Length of `[start, end)` in fractional hours.
///
/// Not clamped: a reversed interval yields a negative value.
pub fn duration_hours<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> f64 {
    ms_to_hours(duration_ms(start, end))
}

/// Converts milliseconds to fractional hours.
#[allow(clippy::cast_precision_loss)]
pub fn ms_to_hours(ms: i64) -> f64 {
    ms as f64 / MS_PER_HOUR as f64
}
