//! Session-length distribution.

use serde::Serialize;

use crate::session::Session;

/// Half-open `[min, max)` hour ranges; the last bucket is unbounded.
const BUCKETS: &[(&str, f64, Option<f64>)] = &[
    ("0-15m", 0.0, Some(0.25)),
    ("15-30m", 0.25, Some(0.5)),
    ("30-60m", 0.5, Some(1.0)),
    ("1-2h", 1.0, Some(2.0)),
    ("2-4h", 2.0, Some(4.0)),
    ("4-8h", 4.0, Some(8.0)),
    ("8h+", 8.0, None),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub label: &'static str,
    pub min_hours: f64,
    pub max_hours: Option<f64>,
    pub count: usize,
}

impl HistogramBucket {
    fn contains(&self, hours: f64) -> bool {
        hours >= self.min_hours && self.max_hours.is_none_or(|max| hours < max)
    }

    /// Percentage of `total` sessions in this bucket; 0 when `total` is 0.
    #[allow(clippy::cast_precision_loss)]
    pub fn share(&self, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            self.count as f64 / total as f64 * 100.0
        }
    }
}

/// Counts sessions per duration bucket.
pub fn duration_histogram(sessions: &[Session]) -> Vec<HistogramBucket> {
    let mut buckets: Vec<HistogramBucket> = BUCKETS
        .iter()
        .map(|&(label, min_hours, max_hours)| HistogramBucket {
            label,
            min_hours,
            max_hours,
            count: 0,
        })
        .collect();

    for session in sessions {
        let hours = session.duration_hours();
        if let Some(bucket) = buckets.iter_mut().find(|b| b.contains(hours)) {
            bucket.count += 1;
        }
    }

    buckets
}
