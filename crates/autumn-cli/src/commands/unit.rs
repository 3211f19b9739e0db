//! `autumn unit`: pick the time-axis unit for a timestamp range.

use anyhow::{Context, Result};
use autumn_core::{TimeUnit, parse_timestamp};
use chrono::TimeZone;

/// Parses both ends in `tz` and chooses the unit.
pub fn unit_for<Tz: TimeZone>(start: &str, end: &str, tz: &Tz) -> Result<TimeUnit> {
    let start = parse_timestamp(start, tz).with_context(|| format!("invalid start: {start}"))?;
    let end = parse_timestamp(end, tz).with_context(|| format!("invalid end: {end}"))?;
    Ok(TimeUnit::choose(&end, &start))
}

pub fn run<Tz: TimeZone>(start: &str, end: &str, tz: &Tz) -> Result<()> {
    println!("{}", unit_for(start, end, tz)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_unit_for_range() {
        assert_eq!(
            unit_for("2025-01-01T00:00:00Z", "2025-02-15T00:00:00Z", &Utc).unwrap(),
            TimeUnit::Week
        );
        assert_eq!(
            unit_for("2025-01-01 09:00", "2025-01-03 17:00", &Utc).unwrap(),
            TimeUnit::Day
        );
    }

    #[test]
    fn test_unit_for_invalid_timestamp() {
        let err = unit_for("yesterday", "2025-01-01T00:00:00Z", &Utc).unwrap_err();
        assert_eq!(err.to_string(), "invalid start: yesterday");
    }
}
