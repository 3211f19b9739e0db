//! Running-total series over daily totals.

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use crate::dates::local_date;
use crate::duration::ms_to_hours;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub running_total_hours: f64,
    /// This day's contribution alone.
    pub daily_hours: f64,
}

/// Per-start-day totals in `tz`, ascending, with a running sum.
///
/// Days without sessions are omitted rather than repeated.
pub fn cumulative_series<Tz: TimeZone>(sessions: &[Session], tz: &Tz) -> Vec<CumulativePoint> {
    let mut daily_ms: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for session in sessions {
        *daily_ms
            .entry(local_date(session.start_time(), tz))
            .or_insert(0) += session.duration_ms();
    }

    let mut running_ms = 0_i64;
    daily_ms
        .into_iter()
        .map(|(date, ms)| {
            running_ms += ms;
            CumulativePoint {
                date,
                running_total_hours: ms_to_hours(running_ms),
                daily_hours: ms_to_hours(ms),
            }
        })
        .collect()
}
