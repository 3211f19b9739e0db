//! Calendar-day helpers: range fill, weekday counting, local day keys.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc, Weekday};

/// Every calendar day in `[min, max]`, ascending.
///
/// Steps by calendar day rather than by 24h, so DST transitions cannot skip
/// or repeat a date. Returns an empty vector when `min > max`.
pub fn fill_dates(min: NaiveDate, max: NaiveDate) -> Vec<NaiveDate> {
    min.iter_days().take_while(|d| *d <= max).collect()
}

/// Weekday index with Sunday = 0.
pub fn weekday_index(weekday: Weekday) -> usize {
    weekday.num_days_from_sunday() as usize
}

/// How many times each weekday occurs in `[start, end]` (index 0 = Sunday).
pub fn count_weekdays(start: NaiveDate, end: NaiveDate) -> [u32; 7] {
    let mut counts = [0; 7];
    for day in fill_dates(start, end) {
        counts[weekday_index(day.weekday())] += 1;
    }
    counts
}

/// The calendar date of `instant` as seen in `tz`.
pub fn local_date<Tz: TimeZone>(instant: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}
