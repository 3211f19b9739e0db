//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use autumn_core::{AverageMode, DEFAULT_TOP_N};
use chrono::{FixedOffset, NaiveDate};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Entities shown individually before the rest is merged into "Other".
    pub top_n: usize,
    /// Timezone used for day keys and hour-of-day buckets.
    pub timezone: DisplayTimezone,
    /// Divisor used for heatmap cell averages.
    pub heatmap_average: HeatmapAverage,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("top_n", &self.top_n)
            .field("timezone", &self.timezone.to_string())
            .field("heatmap_average", &self.heatmap_average)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            timezone: DisplayTimezone::Local,
            heatmap_average: HeatmapAverage::PerOccurrence,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // AUTUMN_TOP_N, AUTUMN_TIMEZONE, ...
        figment = figment.merge(Env::prefixed("AUTUMN_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for autumn.
///
/// On Linux: `~/.config/autumn`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("autumn"))
}

/// The zone charts are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DisplayTimezone {
    /// The machine's local zone, DST included.
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl DisplayTimezone {
    /// Zone name reported alongside rendered data.
    pub fn name(&self) -> String {
        match self {
            Self::Local => iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string()),
            Self::Utc => "UTC".to_string(),
            Self::Fixed(offset) => offset.to_string(),
        }
    }
}

impl fmt::Display for DisplayTimezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("utc"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl FromStr for DisplayTimezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "utc" | "z" => Ok(Self::Utc),
            other => parse_offset(other)
                .map(Self::Fixed)
                .ok_or_else(|| format!("invalid timezone: {s} (expected local, utc or ±HH:MM)")),
        }
    }
}

impl TryFrom<String> for DisplayTimezone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DisplayTimezone> for String {
    fn from(tz: DisplayTimezone) -> Self {
        tz.to_string()
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `+HHMM`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Configured heatmap averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatmapAverage {
    #[default]
    PerOccurrence,
    PerCalendarDay,
}

impl HeatmapAverage {
    /// Averaging mode for data spanning `range`.
    pub const fn mode(self, range: Option<(NaiveDate, NaiveDate)>) -> AverageMode {
        match self {
            Self::PerOccurrence => AverageMode::PerOccurrence,
            Self::PerCalendarDay => AverageMode::PerCalendarDay { range },
        }
    }
}
