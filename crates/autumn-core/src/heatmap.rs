//! Weekday × hour-of-day heatmap.
//!
//! Sessions are cut at every local clock-hour boundary. Each block is
//! attributed to the weekday and hour it starts in, so a session running from
//! 23:30 Friday to 01:00 Saturday feeds three different cells.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc};
use serde::Serialize;

use crate::dates::{count_weekdays, weekday_index};
use crate::duration::ms_to_hours;
use crate::session::Session;

const WEEKDAYS: usize = 7;
const HOURS: usize = 24;

/// How cell averages are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AverageMode {
    /// `total / count`: average length of an observed hour block.
    #[default]
    PerOccurrence,
    /// `total / occurrences of the weekday`: hours on a typical such day.
    ///
    /// Occurrences are counted over `range` (inclusive). Without a range the
    /// divisor is 1.
    PerCalendarDay {
        range: Option<(NaiveDate, NaiveDate)>,
    },
}

/// A slice of a session that lies within one local clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourBlock {
    /// 0 = Sunday.
    pub weekday: usize,
    pub hour: usize,
    pub duration: Duration,
}

/// One weekday/hour cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// 0 = Sunday.
    pub weekday: u8,
    pub hour: u8,
    pub total_hours: f64,
    /// Number of hour blocks that contributed.
    pub count: u32,
    pub average: f64,
}

/// A 7 × 24 matrix of cells, stored row-major by weekday.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    cells: Vec<HeatmapCell>,
    max_average: f64,
}

impl Heatmap {
    /// All 168 cells, Sunday 00:00 first.
    pub fn cells(&self) -> &[HeatmapCell] {
        &self.cells
    }

    pub fn cell(&self, weekday: usize, hour: usize) -> Option<&HeatmapCell> {
        if weekday >= WEEKDAYS || hour >= HOURS {
            return None;
        }
        self.cells.get(weekday * HOURS + hour)
    }

    /// Largest cell average, for intensity scaling.
    pub const fn max_average(&self) -> f64 {
        self.max_average
    }

    /// `cell.average / max_average`, or 0 for an empty heatmap.
    pub fn intensity(&self, cell: &HeatmapCell) -> f64 {
        if self.max_average > 0.0 {
            cell.average / self.max_average
        } else {
            0.0
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.cells.iter().map(|c| c.total_hours).sum()
    }
}

/// Lazy walk over the local clock-hour blocks of one interval.
///
/// Created by [`split_hour_blocks`].
#[derive(Debug, Clone)]
pub struct HourBlocks<'a, Tz> {
    cursor: DateTime<Utc>,
    end: DateTime<Utc>,
    tz: &'a Tz,
}

impl<Tz: TimeZone> Iterator for HourBlocks<'_, Tz> {
    type Item = HourBlock;

    fn next(&mut self) -> Option<HourBlock> {
        if self.cursor >= self.end {
            return None;
        }

        let local = self.cursor.with_timezone(self.tz);
        let into_hour = Duration::seconds(i64::from(local.minute() * 60 + local.second()))
            + Duration::nanoseconds(i64::from(local.nanosecond() % 1_000_000_000));
        let next_hour = self.cursor + (Duration::hours(1) - into_hour);
        let block_end = next_hour.min(self.end);

        let block = HourBlock {
            weekday: weekday_index(local.weekday()),
            hour: local.hour() as usize,
            duration: block_end - self.cursor,
        };
        self.cursor = block_end;
        Some(block)
    }
}

/// Splits `[start, end)` at each local clock-hour boundary in `tz`.
///
/// The block durations always sum to exactly `end - start`.
pub const fn split_hour_blocks<Tz: TimeZone>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    tz: &Tz,
) -> HourBlocks<'_, Tz> {
    HourBlocks {
        cursor: start,
        end,
        tz,
    }
}

/// Bins sessions into the weekday × hour matrix.
pub fn aggregate_heatmap<Tz: TimeZone>(sessions: &[Session], tz: &Tz, mode: AverageMode) -> Heatmap {
    let mut totals = [[Duration::zero(); HOURS]; WEEKDAYS];
    let mut counts = [[0_u32; HOURS]; WEEKDAYS];

    for session in sessions {
        for block in split_hour_blocks(session.start_time(), session.end_time(), tz) {
            totals[block.weekday][block.hour] += block.duration;
            counts[block.weekday][block.hour] += 1;
        }
    }

    let weekday_occurrences = match mode {
        AverageMode::PerOccurrence => None,
        AverageMode::PerCalendarDay { range } => Some(
            range.map_or([1; WEEKDAYS], |(first, last)| count_weekdays(first, last)),
        ),
    };

    let mut cells = Vec::with_capacity(WEEKDAYS * HOURS);
    let mut max_average = 0.0_f64;
    for (weekday, (day_totals, day_counts)) in totals.iter().zip(&counts).enumerate() {
        for (hour, (total, count)) in day_totals.iter().zip(day_counts).enumerate() {
            let total_hours = ms_to_hours(total.num_milliseconds());
            let divisor = weekday_occurrences.map_or(*count, |occ| occ[weekday]);
            let average = if divisor > 0 {
                total_hours / f64::from(divisor)
            } else {
                0.0
            };
            max_average = max_average.max(average);

            cells.push(HeatmapCell {
                weekday: u8::try_from(weekday).unwrap_or_default(),
                hour: u8::try_from(hour).unwrap_or_default(),
                total_hours,
                count: *count,
                average,
            });
        }
    }

    tracing::debug!(sessions = sessions.len(), ?mode, max_average, "aggregated heatmap");

    Heatmap { cells, max_average }
}
