//! Year-view calendar aggregation.
//!
//! Each session's whole duration lands on the day it started, with no
//! splitting at midnight. The output covers every day of one calendar year,
//! anchored to the year of the earliest day key.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, TimeZone};
use serde::Serialize;

use crate::dates::{fill_dates, local_date, weekday_index};
use crate::duration::ms_to_hours;
use crate::session::Session;

/// One day cell of the calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    /// 0 = Sunday.
    pub weekday: u8,
    pub total_hours: f64,
}

/// A dense year of day totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarYear {
    pub year: i32,
    /// Jan 1 through Dec 31, one entry per day.
    pub days: Vec<CalendarDay>,
    /// Largest single-day total, for intensity scaling.
    pub max_hours: f64,
}

impl CalendarYear {
    /// `day.total_hours / max_hours`, or 0 when the year has no activity.
    pub fn intensity(&self, day: &CalendarDay) -> f64 {
        if self.max_hours > 0.0 {
            day.total_hours / self.max_hours
        } else {
            0.0
        }
    }

    /// Sum of all day totals.
    pub fn total_hours(&self) -> f64 {
        self.days.iter().map(|d| d.total_hours).sum()
    }
}

/// Builds the calendar for the year containing the earliest session day.
///
/// Days are keyed in `tz`. With no sessions there is no year to anchor on, so
/// `fallback_year` is used and every day reports zero.
pub fn aggregate_calendar<Tz: TimeZone>(
    sessions: &[Session],
    tz: &Tz,
    fallback_year: i32,
) -> CalendarYear {
    let mut totals_ms: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for session in sessions {
        let day = local_date(session.start_time(), tz);
        *totals_ms.entry(day).or_insert(0) += session.duration_ms();
    }

    let year = totals_ms
        .keys()
        .next()
        .map_or(fallback_year, Datelike::year);

    let days: Vec<CalendarDay> = match (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ) {
        (Some(first), Some(last)) => fill_dates(first, last)
            .into_iter()
            .map(|date| CalendarDay {
                date,
                weekday: u8::try_from(weekday_index(date.weekday())).unwrap_or_default(),
                total_hours: ms_to_hours(totals_ms.get(&date).copied().unwrap_or(0)),
            })
            .collect(),
        _ => Vec::new(),
    };

    let max_hours = days.iter().map(|d| d.total_hours).fold(0.0, f64::max);

    tracing::debug!(
        year,
        sessions = sessions.len(),
        active_days = totals_ms.len(),
        "aggregated calendar"
    );

    CalendarYear {
        year,
        days,
        max_hours,
    }
}
