//! Human-readable duration labels.

/// Formats fractional hours for tooltips and summaries.
///
/// Under an hour shows rounded minutes (`"45m"`), under a day one decimal of
/// hours (`"2.5h"`), otherwise days and whole hours (`"1d 6h"`).
/// Negative input is treated as zero.
#[allow(clippy::cast_possible_truncation)]
pub fn format_hours(hours: f64) -> String {
    let hours = hours.max(0.0);
    if hours < 1.0 {
        format!("{}m", (hours * 60.0).round() as i64)
    } else if hours < 24.0 {
        format!("{hours:.1}h")
    } else {
        let days = (hours / 24.0).floor() as i64;
        let remaining = hours % 24.0;
        format!("{days}d {remaining:.0}h")
    }
}
