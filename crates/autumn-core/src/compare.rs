//! Comparison charts over tallies: the project radar, the status donut, the
//! context bars and the tag bubbles.
//!
//! Tallies carry `total_time` in minutes. Every output here is in hours.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::dates::local_date;
use crate::session::Session;
use crate::topn::EntityTotal;

const MINUTES_PER_HOUR: f64 = 60.0;

/// Projects compared on the radar.
pub const RADAR_TOP_N: usize = 6;

/// Radar axes, in the order of [`RadarProfile::scores`].
pub const RADAR_AXES: [&str; 5] = ["Total Time", "Sessions", "Avg Length", "Subprojects", "Recency"];

/// Days after which a project scores zero recency.
const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// Recency given to projects with no update date.
const UNKNOWN_RECENCY: f64 = 15.0;

/// Statuses in donut order. Other statuses are not drawn.
pub const STATUS_ORDER: [&str; 4] = ["active", "paused", "complete", "archived"];

const MIN_BUBBLE_RADIUS: f64 = 5.0;
const BUBBLE_RADIUS_SCALE: f64 = 3.0;

// ========== Radar ==========

/// Per-project statistics, as delivered by the project stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub name: String,
    pub total_time: f64,
    #[serde(default)]
    pub session_count: u32,
    #[serde(default)]
    pub subproject_count: u32,
    #[serde(default)]
    pub days_since_update: Option<f64>,
}

impl ProjectMetrics {
    fn hours(&self) -> f64 {
        self.total_time / MINUTES_PER_HOUR
    }

    fn average_hours(&self) -> f64 {
        if self.session_count == 0 {
            0.0
        } else {
            self.hours() / f64::from(self.session_count)
        }
    }

    fn recency(&self) -> f64 {
        self.days_since_update
            .map_or(UNKNOWN_RECENCY, |days| (RECENCY_WINDOW_DAYS - days).max(0.0))
    }
}

/// One project on the radar. Scores are 0-100, one per [`RADAR_AXES`] entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarProfile {
    pub name: String,
    pub hours: f64,
    pub session_count: u32,
    pub average_hours: f64,
    pub subproject_count: u32,
    pub recency: f64,
    pub scores: [f64; 5],
}

/// Derives project statistics from sessions.
///
/// Projects keep first-seen order. `days_since_update` counts days from the
/// last session end in `tz` to `today`, never below zero.
pub fn project_metrics<Tz: TimeZone>(
    sessions: &[Session],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<ProjectMetrics> {
    struct Tally<'a> {
        minutes: f64,
        sessions: u32,
        subprojects: BTreeSet<&'a str>,
        last: NaiveDate,
    }

    let mut order: Vec<&str> = Vec::new();
    let mut tallies: HashMap<&str, Tally<'_>> = HashMap::new();
    for session in sessions {
        let day = local_date(session.end_time(), tz);
        let tally = tallies.entry(session.project()).or_insert_with(|| {
            order.push(session.project());
            Tally {
                minutes: 0.0,
                sessions: 0,
                subprojects: BTreeSet::new(),
                last: day,
            }
        });
        tally.minutes += session.duration_hours() * MINUTES_PER_HOUR;
        tally.sessions += 1;
        tally.subprojects.extend(session.subprojects().iter().map(String::as_str));
        tally.last = tally.last.max(day);
    }

    order
        .into_iter()
        .filter_map(|name| {
            let tally = tallies.remove(name)?;
            #[allow(clippy::cast_precision_loss)]
            let days = (today - tally.last).num_days().max(0) as f64;
            Some(ProjectMetrics {
                name: name.to_string(),
                total_time: tally.minutes,
                session_count: tally.sessions,
                subproject_count: u32::try_from(tally.subprojects.len()).unwrap_or(u32::MAX),
                days_since_update: Some(days),
            })
        })
        .collect()
}

/// Scores the top [`RADAR_TOP_N`] projects by total time against each other.
///
/// Projects without time are skipped. Each axis is scaled by its largest
/// value, floored at 1 so all-zero axes stay at 0. Recency is scaled by the
/// fixed 30-day window.
pub fn radar_profiles(mut projects: Vec<ProjectMetrics>) -> Vec<RadarProfile> {
    projects.retain(|p| p.total_time > 0.0);
    projects.sort_by(|a, b| b.total_time.total_cmp(&a.total_time));
    projects.truncate(RADAR_TOP_N);

    let axis_max = |metric: fn(&ProjectMetrics) -> f64| {
        projects.iter().map(metric).fold(1.0_f64, f64::max)
    };
    let max_hours = axis_max(ProjectMetrics::hours);
    let max_sessions = axis_max(|p| f64::from(p.session_count));
    let max_average = axis_max(ProjectMetrics::average_hours);
    let max_subprojects = axis_max(|p| f64::from(p.subproject_count));

    projects
        .iter()
        .map(|p| {
            let scores = [
                p.hours() / max_hours * 100.0,
                f64::from(p.session_count) / max_sessions * 100.0,
                p.average_hours() / max_average * 100.0,
                f64::from(p.subproject_count) / max_subprojects * 100.0,
                p.recency() / RECENCY_WINDOW_DAYS * 100.0,
            ];
            RadarProfile {
                name: p.name.clone(),
                hours: p.hours(),
                session_count: p.session_count,
                average_hours: p.average_hours(),
                subproject_count: p.subproject_count,
                recency: p.recency(),
                scores,
            }
        })
        .collect()
}

// ========== Status ==========

/// Time per project status, as delivered by the status tally endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTally {
    pub status: String,
    #[serde(default)]
    pub count: u64,
    pub total_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSlice {
    pub status: String,
    pub count: u64,
    pub hours: f64,
    /// `"<status> (<count>)"`
    pub label: String,
}

/// Orders tallies as [`STATUS_ORDER`].
///
/// The first tally per status is used; unknown statuses are dropped.
pub fn status_breakdown(tallies: &[StatusTally]) -> Vec<StatusSlice> {
    STATUS_ORDER
        .iter()
        .filter_map(|status| tallies.iter().find(|t| t.status == *status))
        .map(|tally| StatusSlice {
            status: tally.status.clone(),
            count: tally.count,
            hours: tally.total_time / MINUTES_PER_HOUR,
            label: format!("{} ({})", tally.status, tally.count),
        })
        .collect()
}

// ========== Context ==========

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextBar {
    pub name: String,
    pub hours: f64,
}

/// Context totals in hours, largest first. Ties keep input order.
pub fn context_totals(mut totals: Vec<EntityTotal>) -> Vec<ContextBar> {
    totals.sort_by(|a, b| b.total_time.total_cmp(&a.total_time));
    totals
        .into_iter()
        .map(|total| ContextBar {
            name: total.name,
            hours: total.total_time / MINUTES_PER_HOUR,
        })
        .collect()
}

// ========== Tags ==========

/// Time and project count per tag, as delivered by the tag tally endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagTally {
    pub name: String,
    pub total_time: f64,
    #[serde(default)]
    pub project_count: u32,
    #[serde(default)]
    pub color: Option<String>,
}

/// A tag placed by project count (x) and hours (y).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bubble {
    pub name: String,
    pub x: u32,
    pub y: f64,
    pub r: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One bubble per tag. The radius grows with the square root of the hours and
/// never drops below 5.
pub fn tag_bubbles(tags: &[TagTally]) -> Vec<Bubble> {
    tags.iter()
        .map(|tag| {
            let hours = tag.total_time / MINUTES_PER_HOUR;
            Bubble {
                name: tag.name.clone(),
                x: tag.project_count,
                y: hours,
                r: (hours.max(0.0).sqrt() * BUBBLE_RADIUS_SCALE).max(MIN_BUBBLE_RADIUS),
                color: tag.color.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use serde_json::json;

    fn metrics(name: &str, minutes: f64, sessions: u32, subprojects: u32, days: Option<f64>) -> ProjectMetrics {
        ProjectMetrics {
            name: name.to_string(),
            total_time: minutes,
            session_count: sessions,
            subproject_count: subprojects,
            days_since_update: days,
        }
    }

    fn assert_scores(actual: [f64; 5], expected: [f64; 5]) {
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "scores {actual:?} != {expected:?}");
        }
    }

    // ========== Radar ==========

    #[test]
    fn test_radar_scales_each_axis_by_its_max() {
        let profiles = radar_profiles(vec![
            metrics("a", 600.0, 5, 2, Some(0.0)),
            metrics("b", 300.0, 10, 4, Some(20.0)),
        ]);

        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].name, "a");
        // a: 10h over 5 sessions = 2h avg; b: 5h over 10 = 0.5h avg
        assert_scores(profiles[0].scores, [100.0, 50.0, 100.0, 50.0, 100.0]);
        assert_scores(profiles[1].scores, [50.0, 100.0, 25.0, 100.0, 100.0 / 3.0]);
        assert!((profiles[1].recency - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_radar_keeps_top_six_with_time() {
        let mut projects: Vec<_> = (1..=8)
            .map(|i| metrics(&format!("p{i}"), f64::from(i) * 60.0, 1, 0, None))
            .collect();
        projects.push(metrics("idle", 0.0, 3, 1, Some(1.0)));

        let names: Vec<_> = radar_profiles(projects).into_iter().map(|p| p.name).collect();

        assert_eq!(names, vec!["p8", "p7", "p6", "p5", "p4", "p3"]);
    }

    #[test]
    fn test_radar_all_zero_axes_score_zero() {
        let profiles = radar_profiles(vec![metrics("tiny", 0.5, 0, 0, Some(45.0))]);

        // hours 0.5/60 under the floor of 1, no sessions, no subprojects, stale
        let hours_score = 0.5 / 60.0 * 100.0;
        assert_scores(profiles[0].scores, [hours_score, 0.0, 0.0, 0.0, 0.0]);
        assert!(profiles[0].scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_radar_missing_update_date_is_half_recency() {
        let project: ProjectMetrics =
            serde_json::from_value(json!({"name": "quiet", "total_time": 120})).unwrap();

        let profiles = radar_profiles(vec![project]);

        assert!((profiles[0].recency - 15.0).abs() < 1e-9);
        assert!((profiles[0].scores[4] - 50.0).abs() < 1e-9);
        assert_eq!(profiles[0].session_count, 0);
        assert!(profiles[0].average_hours.abs() < 1e-9);
    }

    #[test]
    fn test_radar_empty_when_nothing_tracked() {
        assert!(radar_profiles(Vec::new()).is_empty());
        assert!(radar_profiles(vec![metrics("idle", 0.0, 0, 0, None)]).is_empty());
    }

    #[test]
    fn test_project_metrics_from_sessions() {
        let at = |day: u32, hour: u32| -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap() };
        let sessions = vec![
            Session::new(at(1, 9), at(1, 10), "autumn")
                .unwrap()
                .with_subprojects(vec!["ui".to_string(), "api".to_string()]),
            Session::new(at(2, 9), at(2, 9) + Duration::minutes(30), "garden").unwrap(),
            Session::new(at(5, 9), at(5, 11), "autumn")
                .unwrap()
                .with_subprojects(vec!["ui".to_string()]),
        ];
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();

        let projects = project_metrics(&sessions, &Utc, today);

        assert_eq!(
            projects,
            vec![
                metrics("autumn", 180.0, 2, 2, Some(5.0)),
                metrics("garden", 30.0, 1, 0, Some(8.0)),
            ]
        );
    }

    // ========== Status ==========

    #[test]
    fn test_status_breakdown_fixed_order() {
        let tallies: Vec<StatusTally> = serde_json::from_value(json!([
            {"status": "archived", "count": 4, "total_time": 30},
            {"status": "someday", "count": 1, "total_time": 600},
            {"status": "active", "count": 3, "total_time": 90},
            {"status": "active", "count": 9, "total_time": 9000},
        ]))
        .unwrap();

        let slices = status_breakdown(&tallies);

        let labels: Vec<_> = slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["active (3)", "archived (4)"]);
        assert!((slices[0].hours - 1.5).abs() < 1e-9);
        assert!((slices[1].hours - 0.5).abs() < 1e-9);
    }

    // ========== Context ==========

    #[test]
    fn test_context_totals_largest_first() {
        let bars = context_totals(vec![
            EntityTotal::new("home", 60.0),
            EntityTotal::new("work", 180.0),
            EntityTotal::new("study", 60.0),
        ]);

        let names: Vec<_> = bars.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["work", "home", "study"]);
        assert!((bars[0].hours - 3.0).abs() < 1e-9);
    }

    // ========== Tags ==========

    #[test]
    fn test_tag_bubbles() {
        let tags: Vec<TagTally> = serde_json::from_value(json!([
            {"name": "deep", "total_time": 960, "project_count": 3, "color": "#336699"},
            {"name": "misc", "total_time": 30},
        ]))
        .unwrap();

        let bubbles = tag_bubbles(&tags);

        // 16h gives sqrt(16) * 3 = 12
        assert_eq!(
            bubbles[0],
            Bubble {
                name: "deep".to_string(),
                x: 3,
                y: 16.0,
                r: 12.0,
                color: Some("#336699".to_string()),
            }
        );
        assert_eq!(bubbles[1].x, 0);
        assert!((bubbles[1].r - 5.0).abs() < 1e-9);
        assert_eq!(serde_json::to_value(&bubbles[1]).unwrap().get("color"), None);
    }
}
