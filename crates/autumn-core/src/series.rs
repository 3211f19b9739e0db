//! Multi-series grouping for scatter, line and stacked-area charts.
//!
//! Sessions are grouped by an entity key (project or subproject) into named
//! series. Series come back ordered by name, ignoring case and putting
//! lowercase first on ties, with the merged "Other" series always last. When a
//! top-N limit applies, entities are ranked by total duration first and
//! everything past the limit is folded into that "Other" series.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::dates::{fill_dates, local_date};
use crate::duration::ms_to_hours;
use crate::session::Session;
use crate::topn::{OTHER_LABEL, split_top_n};
use crate::unit::TimeUnit;

/// Series name for sessions without any subproject.
pub const NO_SUBPROJECT: &str = "no subproject";

/// Which entity a session is grouped under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKey {
    #[default]
    Project,
    /// One entry per subproject; [`NO_SUBPROJECT`] when there are none.
    Subproject,
}

impl SeriesKey {
    /// The entity names `session` contributes to.
    pub fn names(self, session: &Session) -> Vec<&str> {
        match self {
            Self::Project => vec![session.project()],
            Self::Subproject if session.subprojects().is_empty() => vec![NO_SUBPROJECT],
            Self::Subproject => session.subprojects().iter().map(String::as_str).collect(),
        }
    }
}

/// Label of a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SeriesLabel {
    Named(String),
    /// `merged_count` entities folded together past the top-N cut.
    Other { merged_count: usize },
}

impl SeriesLabel {
    pub const fn is_other(&self) -> bool {
        matches!(self, Self::Other { .. })
    }
}

impl Ord for SeriesLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Named(a), Self::Named(b)) => collate(a, b),
            (Self::Named(_), Self::Other { .. }) => Ordering::Less,
            (Self::Other { .. }, Self::Named(_)) => Ordering::Greater,
            (Self::Other { merged_count: a }, Self::Other { merged_count: b }) => a.cmp(b),
        }
    }
}

/// Orders names ignoring case, then puts lowercase before uppercase among
/// names that differ only in case.
fn collate(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| b.cmp(a))
}

impl PartialOrd for SeriesLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SeriesLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Other { merged_count } => write!(f, "{OTHER_LABEL} ({merged_count})"),
        }
    }
}

impl Serialize for SeriesLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let merged_count = match self {
            Self::Named(_) => 0,
            Self::Other { merged_count } => *merged_count,
        };
        let mut state = serializer.serialize_struct("SeriesLabel", 3)?;
        state.serialize_field("name", &self.to_string())?;
        state.serialize_field("is_other", &self.is_other())?;
        state.serialize_field("merged_count", &merged_count)?;
        state.end()
    }
}

/// One `(x, y)` sample; `y` is in hours.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point<X> {
    pub x: X,
    pub y: f64,
}

/// A labelled sequence of points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedSeries<X> {
    #[serde(flatten)]
    pub label: SeriesLabel,
    pub points: Vec<Point<X>>,
}

impl<X> NamedSeries<X> {
    pub fn total_hours(&self) -> f64 {
        self.points.iter().map(|p| p.y).sum()
    }
}

/// Values usable on a time axis.
pub trait AxisValue: Copy + Ord {
    /// Unit for an axis spanning `[start, end]`.
    fn unit_between(end: Self, start: Self) -> TimeUnit;
}

impl AxisValue for DateTime<Utc> {
    fn unit_between(end: Self, start: Self) -> TimeUnit {
        TimeUnit::choose(&end, &start)
    }
}

impl AxisValue for NaiveDate {
    fn unit_between(end: Self, start: Self) -> TimeUnit {
        TimeUnit::for_dates(end, start)
    }
}

/// Time unit for the x range covered by all points, if there are any.
pub fn series_time_unit<X: AxisValue>(series: &[NamedSeries<X>]) -> Option<TimeUnit> {
    let mut xs = series.iter().flat_map(|s| s.points.iter().map(|p| p.x));
    let first = xs.next()?;
    let (min, max) = xs.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x)));
    Some(X::unit_between(max, min))
}

/// How a daily series treats days without activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fill {
    /// Only days with a positive total (line charts).
    #[default]
    Sparse,
    /// Every day between the first and last active day, zeros included
    /// (stacked charts, which need aligned x values across series).
    Dense,
}

/// Options for [`daily_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyOptions {
    pub top_n: Option<usize>,
    pub fill: Fill,
}

/// Per-entity accumulator, in first-seen order.
struct Group<V> {
    name: String,
    total_ms: i64,
    value: V,
}

fn collect_groups<V: Default>(
    sessions: &[Session],
    key: SeriesKey,
    mut add: impl FnMut(&mut V, &Session),
) -> Vec<Group<V>> {
    let mut groups: Vec<Group<V>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for session in sessions {
        for name in key.names(session) {
            let slot = *index.entry(name.to_string()).or_insert_with(|| {
                groups.push(Group {
                    name: name.to_string(),
                    total_ms: 0,
                    value: V::default(),
                });
                groups.len() - 1
            });
            let group = &mut groups[slot];
            group.total_ms += session.duration_ms();
            add(&mut group.value, session);
        }
    }

    groups
}

/// Applies the optional top-N cut and returns label-ordered values.
#[allow(clippy::cast_precision_loss)]
fn label_groups<V: Default>(
    groups: Vec<Group<V>>,
    top_n: Option<usize>,
    mut merge: impl FnMut(&mut V, V),
) -> Vec<(SeriesLabel, V)> {
    let (kept, rest) = match top_n {
        Some(n) if groups.len() > n => split_top_n(groups, n, |g| g.total_ms as f64),
        _ => (groups, Vec::new()),
    };

    let mut labelled: Vec<(SeriesLabel, V)> = kept
        .into_iter()
        .map(|g| (SeriesLabel::Named(g.name), g.value))
        .collect();

    if !rest.is_empty() {
        let merged_count = rest.len();
        let mut other = V::default();
        for group in rest {
            merge(&mut other, group.value);
        }
        labelled.push((SeriesLabel::Other { merged_count }, other));
    }

    labelled.sort_by(|a, b| a.0.cmp(&b.0));
    labelled
}

/// Per-session points grouped by `key`: `x` is the end time, `y` the duration.
pub fn group_series(sessions: &[Session], key: SeriesKey) -> Vec<NamedSeries<DateTime<Utc>>> {
    scatter(sessions, key, None)
}

/// Like [`group_series`], keeping only the `top_n` entities with the most
/// total time and merging the rest into one "Other" series.
pub fn group_ranked_series(
    sessions: &[Session],
    key: SeriesKey,
    top_n: usize,
) -> Vec<NamedSeries<DateTime<Utc>>> {
    scatter(sessions, key, Some(top_n))
}

fn scatter(
    sessions: &[Session],
    key: SeriesKey,
    top_n: Option<usize>,
) -> Vec<NamedSeries<DateTime<Utc>>> {
    let groups = collect_groups(sessions, key, |points: &mut Vec<Point<DateTime<Utc>>>, s| {
        points.push(Point {
            x: s.end_time(),
            y: s.duration_hours(),
        });
    });

    let series: Vec<_> = label_groups(groups, top_n, |acc, points| acc.extend(points))
        .into_iter()
        .map(|(label, points)| NamedSeries { label, points })
        .collect();

    tracing::debug!(?key, ?top_n, series = series.len(), "grouped session series");
    series
}

/// Per-entity daily totals keyed by start day in `tz`.
pub fn daily_series<Tz: TimeZone>(
    sessions: &[Session],
    key: SeriesKey,
    tz: &Tz,
    options: DailyOptions,
) -> Vec<NamedSeries<NaiveDate>> {
    let groups = collect_groups(sessions, key, |days: &mut BTreeMap<NaiveDate, i64>, s| {
        *days.entry(local_date(s.start_time(), tz)).or_insert(0) += s.duration_ms();
    });

    let labelled = label_groups(groups, options.top_n, |acc, days| {
        for (day, ms) in days {
            *acc.entry(day).or_insert(0) += ms;
        }
    });

    let first = labelled.iter().filter_map(|(_, days)| days.keys().next()).min().copied();
    let last = labelled.iter().filter_map(|(_, days)| days.keys().next_back()).max().copied();
    let axis = match (options.fill, first, last) {
        (Fill::Dense, Some(first), Some(last)) => fill_dates(first, last),
        _ => Vec::new(),
    };

    let series: Vec<_> = labelled
        .into_iter()
        .map(|(label, days)| {
            let points = match options.fill {
                Fill::Dense => axis
                    .iter()
                    .map(|day| Point {
                        x: *day,
                        y: ms_to_hours(days.get(day).copied().unwrap_or(0)),
                    })
                    .collect(),
                Fill::Sparse => days
                    .into_iter()
                    .filter(|(_, ms)| *ms > 0)
                    .map(|(day, ms)| Point {
                        x: day,
                        y: ms_to_hours(ms),
                    })
                    .collect(),
            };
            NamedSeries { label, points }
        })
        .collect();

    tracing::debug!(?key, ?options, series = series.len(), "built daily series");
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, d, h, 0, 0).unwrap()
    }

    fn session(project: &str, d: u32, h: u32, minutes: i64) -> Session {
        let start = at(d, h);
        Session::new(start, start + Duration::minutes(minutes), project).unwrap()
    }

    fn sub_session(subs: &[&str], d: u32, minutes: i64) -> Session {
        session("autumn", d, 9, minutes)
            .with_subprojects(subs.iter().map(|s| (*s).to_string()).collect())
    }

    fn labels<X>(series: &[NamedSeries<X>]) -> Vec<String> {
        series.iter().map(|s| s.label.to_string()).collect()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
    }

    // ========== Labels ==========

    #[test]
    fn test_other_label_formats_count() {
        assert_eq!(SeriesLabel::Other { merged_count: 3 }.to_string(), "Other (3)");
        assert_eq!(SeriesLabel::Named("api".into()).to_string(), "api");
    }

    #[test]
    fn test_other_sorts_after_any_name() {
        let mut labels = vec![
            SeriesLabel::Other { merged_count: 2 },
            SeriesLabel::Named("zeta".into()),
            SeriesLabel::Named("Alpha".into()),
            SeriesLabel::Named("alpha".into()),
        ];
        labels.sort();
        assert_eq!(
            labels,
            vec![
                SeriesLabel::Named("alpha".into()),
                SeriesLabel::Named("Alpha".into()),
                SeriesLabel::Named("zeta".into()),
                SeriesLabel::Other { merged_count: 2 },
            ]
        );
    }

    // ========== Session series ==========

    #[test]
    fn test_group_by_project_alphabetical() {
        let sessions = vec![
            session("web", 1, 9, 60),
            session("api", 1, 11, 30),
            session("web", 2, 9, 90),
        ];
        let series = group_series(&sessions, SeriesKey::Project);

        assert_eq!(labels(&series), vec!["api", "web"]);
        assert_eq!(series[1].points.len(), 2);
        assert_eq!(series[1].points[0].x, at(1, 10));
        assert!((series[1].points[1].y - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_group_by_project_ignores_case_when_ordering() {
        let sessions = vec![
            session("alpha", 1, 9, 30),
            session("Zeta", 1, 10, 30),
            session("beta", 1, 11, 30),
            session("Beta", 1, 12, 30),
        ];
        let series = group_series(&sessions, SeriesKey::Project);

        assert_eq!(labels(&series), vec!["alpha", "beta", "Beta", "Zeta"]);
    }

    #[test]
    fn test_group_by_subproject_fans_out() {
        let sessions = vec![
            sub_session(&["ui", "api"], 1, 60),
            sub_session(&[], 2, 30),
            sub_session(&["api"], 3, 15),
        ];
        let series = group_series(&sessions, SeriesKey::Subproject);

        assert_eq!(labels(&series), vec!["api", NO_SUBPROJECT, "ui"]);
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[1].points.len(), 1);
        assert!((series[2].total_hours() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_ranked_series_merges_tail_into_other() {
        // p0 has the least time, p8 the most
        let sessions: Vec<_> = (0..9)
            .map(|i| session(&format!("p{i}"), 1, 0, 10 + i64::from(i) * 10))
            .collect();
        let series = group_ranked_series(&sessions, SeriesKey::Project, 7);

        assert_eq!(
            labels(&series),
            vec!["p2", "p3", "p4", "p5", "p6", "p7", "p8", "Other (2)"]
        );
        let other = series.last().unwrap();
        assert_eq!(other.label, SeriesLabel::Other { merged_count: 2 });
        assert_eq!(other.points.len(), 2);
        assert!((other.total_hours() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ranked_series_without_tail_has_no_other() {
        let sessions = vec![session("a", 1, 9, 60), session("b", 1, 10, 60)];
        let series = group_ranked_series(&sessions, SeriesKey::Project, 7);

        assert!(series.iter().all(|s| !s.label.is_other()));
    }

    #[test]
    fn test_series_time_unit() {
        let sessions = vec![session("a", 1, 9, 60), session("b", 28, 9, 60)];
        let series = group_series(&sessions, SeriesKey::Project);

        assert_eq!(series_time_unit(&series), Some(TimeUnit::Week));
        assert_eq!(series_time_unit::<DateTime<Utc>>(&[]), None);
    }

    #[test]
    fn test_series_label_serializes_flat() {
        let series = NamedSeries::<NaiveDate> {
            label: SeriesLabel::Other { merged_count: 4 },
            points: vec![],
        };
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Other (4)",
                "is_other": true,
                "merged_count": 4,
                "points": []
            })
        );
    }

    // ========== Daily series ==========

    #[test]
    fn test_daily_sparse_skips_empty_days() {
        let sessions = vec![
            session("a", 1, 9, 60),
            session("a", 1, 14, 30),
            session("a", 4, 9, 0),
            session("b", 3, 9, 45),
        ];
        let series = daily_series(&sessions, SeriesKey::Project, &Utc, DailyOptions::default());

        let a: Vec<_> = series[0].points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(a, vec![(date(1), 1.5)]);
        assert_eq!(series[1].points.len(), 1);
    }

    #[test]
    fn test_daily_dense_aligns_all_series() {
        let sessions = vec![session("a", 1, 9, 60), session("b", 5, 9, 30)];
        let options = DailyOptions {
            top_n: None,
            fill: Fill::Dense,
        };
        let series = daily_series(&sessions, SeriesKey::Project, &Utc, options);

        for s in &series {
            let xs: Vec<_> = s.points.iter().map(|p| p.x).collect();
            assert_eq!(xs, fill_dates(date(1), date(5)));
        }
        assert!(series[0].points[2].y.abs() < f64::EPSILON);
        assert!((series[1].points[4].y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_daily_top_n_sums_other_per_day() {
        let sessions = vec![
            session("big", 1, 9, 240),
            session("small1", 1, 9, 30),
            session("small2", 1, 12, 15),
            session("small2", 2, 12, 15),
        ];
        let options = DailyOptions {
            top_n: Some(1),
            fill: Fill::Sparse,
        };
        let series = daily_series(&sessions, SeriesKey::Project, &Utc, options);

        assert_eq!(labels(&series), vec!["big", "Other (2)"]);
        let other: Vec<_> = series[1].points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(other, vec![(date(1), 0.75), (date(2), 0.25)]);
    }

    #[test]
    fn test_daily_empty_input() {
        let options = DailyOptions {
            top_n: Some(3),
            fill: Fill::Dense,
        };
        assert!(daily_series(&[], SeriesKey::Subproject, &Utc, options).is_empty());
    }
}
