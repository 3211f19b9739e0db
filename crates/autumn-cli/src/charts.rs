//! Chart kinds and the registry that maps each kind to its data builder.
//!
//! Every builder takes a [`ChartInput`] and returns chart-ready JSON. The
//! registry is an ordinary value built in `main` and passed down; nothing is
//! registered globally.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use autumn_core::{
    AxisValue, ContextTotal, DailyOptions, EntityTotal, Fill, NamedSeries, ProjectMetrics, RADAR_AXES,
    Ranked, SeriesKey, Session, StatusTally, TagTally, TreeNode, aggregate_calendar, aggregate_heatmap,
    consolidate_top_n, context_totals, cumulative_series, daily_series, duration_histogram,
    flatten_projects, flatten_tree, format_hours, group_ranked_series, group_series, local_date,
    project_metrics, radar_profiles, series_time_unit, status_breakdown, tag_bubbles,
};
use chrono::{Datelike, NaiveDate, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::Config;

/// Minutes per hour; tally totals are reported in minutes.
const MINUTES_PER_HOUR: f64 = 60.0;

/// Every chart the CLI can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Pie,
    Bar,
    Scatter,
    ScatterSubprojects,
    Line,
    LineSubprojects,
    StackedArea,
    StackedAreaSubprojects,
    Cumulative,
    Calendar,
    Heatmap,
    Histogram,
    Radar,
    Status,
    Context,
    Bubble,
    Treemap,
}

impl ChartKind {
    pub const ALL: [Self; 17] = [
        Self::Pie,
        Self::Bar,
        Self::Scatter,
        Self::ScatterSubprojects,
        Self::Line,
        Self::LineSubprojects,
        Self::StackedArea,
        Self::StackedAreaSubprojects,
        Self::Cumulative,
        Self::Calendar,
        Self::Heatmap,
        Self::Histogram,
        Self::Radar,
        Self::Status,
        Self::Context,
        Self::Bubble,
        Self::Treemap,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pie => "pie",
            Self::Bar => "bar",
            Self::Scatter => "scatter",
            Self::ScatterSubprojects => "scatter_subprojects",
            Self::Line => "line",
            Self::LineSubprojects => "line_subprojects",
            Self::StackedArea => "stacked_area",
            Self::StackedAreaSubprojects => "stacked_area_subprojects",
            Self::Cumulative => "cumulative",
            Self::Calendar => "calendar",
            Self::Heatmap => "heatmap",
            Self::Histogram => "histogram",
            Self::Radar => "radar",
            Self::Status => "status",
            Self::Context => "context",
            Self::Bubble => "bubble",
            Self::Treemap => "treemap",
        }
    }

    /// The variant to draw when the data is filtered to one project.
    ///
    /// Per-project charts switch to their subproject breakdown; all other
    /// kinds are unchanged.
    #[must_use]
    pub const fn for_project(self) -> Self {
        match self {
            Self::Scatter => Self::ScatterSubprojects,
            Self::Line => Self::LineSubprojects,
            Self::StackedArea => Self::StackedAreaSubprojects,
            other => other,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = UnknownChartKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownChartKind(s.to_string()))
    }
}

/// Error type for unknown chart kind strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChartKind(String);

impl fmt::Display for UnknownChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chart kind: {}", self.0)
    }
}

impl std::error::Error for UnknownChartKind {}

/// Records a chart is built from.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Sessions(Vec<Session>),
    /// Tally records (project totals, stats, statuses, tags), decoded per chart.
    Records(Vec<Value>),
    /// A `{ name, children }` hierarchy; only the treemap accepts it.
    Tree(Value),
}

impl ChartData {
    const fn describe(&self) -> &'static str {
        match self {
            Self::Sessions(_) => "session records",
            Self::Records(_) => "tally records",
            Self::Tree(_) => "a hierarchy",
        }
    }

    /// True when there is nothing to chart.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Sessions(sessions) => sessions.is_empty(),
            Self::Records(records) => records.is_empty(),
            Self::Tree(_) => false,
        }
    }
}

/// Everything a chart builder may read.
pub struct ChartInput<'a, Tz> {
    pub data: &'a ChartData,
    pub tz: &'a Tz,
    pub config: &'a Config,
    /// Current date in `tz`.
    pub today: NaiveDate,
    /// Inclusive date filter applied to the sessions, if any.
    pub range: Option<(NaiveDate, NaiveDate)>,
    /// Entity used by the pie and bar charts.
    pub key: SeriesKey,
}

impl<Tz: TimeZone> ChartInput<'_, Tz> {
    fn sessions(&self, kind: ChartKind) -> Result<&[Session]> {
        match self.data {
            ChartData::Sessions(sessions) => Ok(sessions.as_slice()),
            data if data.is_empty() => Ok(&[][..]),
            data => bail!("the {kind} chart needs session records, got {}", data.describe()),
        }
    }

    /// Decodes every tally record as `T`. An empty input of any shape is no records.
    fn records<T: DeserializeOwned>(&self, kind: ChartKind) -> Result<Vec<T>> {
        match self.data {
            ChartData::Records(records) => records
                .iter()
                .enumerate()
                .map(|(i, record)| {
                    T::deserialize(record)
                        .with_context(|| format!("record {i} does not fit the {kind} chart"))
                })
                .collect(),
            data if data.is_empty() => Ok(Vec::new()),
            data => bail!("the {kind} chart needs tally records, got {}", data.describe()),
        }
    }

    /// Totals in minutes, in first-seen order.
    fn entity_totals(&self, kind: ChartKind) -> Result<Vec<EntityTotal>> {
        let ChartData::Sessions(sessions) = self.data else {
            return self.records(kind);
        };

        let mut totals: Vec<EntityTotal> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        for session in sessions {
            let minutes = session.duration_hours() * MINUTES_PER_HOUR;
            for name in self.key.names(session) {
                let slot = *index.entry(name).or_insert_with(|| {
                    totals.push(EntityTotal::new(name, 0.0));
                    totals.len() - 1
                });
                totals[slot].total_time += minutes;
            }
        }
        Ok(totals)
    }

    /// Session date span in `tz`, unless an explicit range was given.
    fn date_span(&self, sessions: &[Session]) -> Option<(NaiveDate, NaiveDate)> {
        self.range.or_else(|| {
            let dates = sessions.iter().map(|s| local_date(s.start_time(), self.tz));
            let first = dates.clone().min()?;
            let last = dates.max()?;
            Some((first, last))
        })
    }
}

/// Builds the data for one chart kind.
pub type ChartFn<Tz> = fn(&ChartInput<'_, Tz>) -> Result<Value>;

/// Maps chart kinds to their builders.
pub struct ChartRegistry<Tz> {
    charts: HashMap<ChartKind, ChartFn<Tz>>,
}

impl<Tz: TimeZone> ChartRegistry<Tz> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            charts: HashMap::new(),
        }
    }

    /// Registry with a builder for every [`ChartKind`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(ChartKind::Pie, pie::<Tz>);
        registry.register(ChartKind::Bar, bar::<Tz>);
        registry.register(ChartKind::Scatter, scatter::<Tz>);
        registry.register(ChartKind::ScatterSubprojects, scatter_subprojects::<Tz>);
        registry.register(ChartKind::Line, line::<Tz>);
        registry.register(ChartKind::LineSubprojects, line_subprojects::<Tz>);
        registry.register(ChartKind::StackedArea, stacked_area::<Tz>);
        registry.register(ChartKind::StackedAreaSubprojects, stacked_area_subprojects::<Tz>);
        registry.register(ChartKind::Cumulative, cumulative::<Tz>);
        registry.register(ChartKind::Calendar, calendar::<Tz>);
        registry.register(ChartKind::Heatmap, heatmap::<Tz>);
        registry.register(ChartKind::Histogram, histogram::<Tz>);
        registry.register(ChartKind::Radar, radar::<Tz>);
        registry.register(ChartKind::Status, status::<Tz>);
        registry.register(ChartKind::Context, context::<Tz>);
        registry.register(ChartKind::Bubble, bubble::<Tz>);
        registry.register(ChartKind::Treemap, treemap::<Tz>);
        registry
    }

    /// Adds or replaces the builder for `kind`.
    pub fn register(&mut self, kind: ChartKind, chart: ChartFn<Tz>) {
        self.charts.insert(kind, chart);
    }

    /// Registered kinds in declaration order.
    pub fn kinds(&self) -> Vec<ChartKind> {
        let mut kinds: Vec<_> = self.charts.keys().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    /// Runs the builder registered for `kind`.
    pub fn build(&self, kind: ChartKind, input: &ChartInput<'_, Tz>) -> Result<Value> {
        let Some(chart) = self.charts.get(&kind) else {
            bail!("no chart registered for {kind}");
        };
        tracing::debug!(%kind, "building chart data");
        chart(input)
    }
}

impl<Tz: TimeZone> Default for ChartRegistry<Tz> {
    fn default() -> Self {
        Self::new()
    }
}

// ========== Totals ==========

fn ranked_json(ranked: &[Ranked]) -> Result<Vec<Value>> {
    ranked
        .iter()
        .map(|entry| {
            let hours = entry.total_time() / MINUTES_PER_HOUR;
            let mut value = serde_json::to_value(entry)?;
            if let Value::Object(map) = &mut value {
                map.insert("hours".to_string(), json!(hours));
                map.insert("label".to_string(), json!(format_hours(hours)));
            }
            Ok(value)
        })
        .collect()
}

fn pie<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let ranked = consolidate_top_n(input.entity_totals(ChartKind::Pie)?, input.config.top_n);
    let total_hours: f64 = ranked.iter().map(Ranked::total_time).sum::<f64>() / MINUTES_PER_HOUR;
    Ok(json!({
        "total_hours": total_hours,
        "slices": ranked_json(&ranked)?,
    }))
}

fn bar<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let ranked = consolidate_top_n(input.entity_totals(ChartKind::Bar)?, input.config.top_n);
    Ok(json!({ "bars": ranked_json(&ranked)? }))
}

// ========== Series ==========

fn series_json<X: AxisValue + Serialize>(series: &[NamedSeries<X>]) -> Result<Value> {
    Ok(json!({
        "unit": series_time_unit(series),
        "series": serde_json::to_value(series)?,
    }))
}

fn scatter<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::Scatter)?;
    series_json(&group_ranked_series(sessions, SeriesKey::Project, input.config.top_n))
}

fn scatter_subprojects<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::ScatterSubprojects)?;
    series_json(&group_series(sessions, SeriesKey::Subproject))
}

fn daily<Tz: TimeZone>(input: &ChartInput<'_, Tz>, kind: ChartKind, key: SeriesKey, options: DailyOptions) -> Result<Value> {
    let sessions = input.sessions(kind)?;
    series_json(&daily_series(sessions, key, input.tz, options))
}

fn line<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let options = DailyOptions {
        top_n: Some(input.config.top_n),
        fill: Fill::Sparse,
    };
    daily(input, ChartKind::Line, SeriesKey::Project, options)
}

fn line_subprojects<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let options = DailyOptions {
        top_n: None,
        fill: Fill::Sparse,
    };
    daily(input, ChartKind::LineSubprojects, SeriesKey::Subproject, options)
}

fn stacked_area<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let options = DailyOptions {
        top_n: Some(input.config.top_n),
        fill: Fill::Dense,
    };
    daily(input, ChartKind::StackedArea, SeriesKey::Project, options)
}

fn stacked_area_subprojects<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let options = DailyOptions {
        top_n: None,
        fill: Fill::Dense,
    };
    daily(input, ChartKind::StackedAreaSubprojects, SeriesKey::Subproject, options)
}

// ========== Time ==========

fn cumulative<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::Cumulative)?;
    Ok(serde_json::to_value(cumulative_series(sessions, input.tz))?)
}

fn calendar<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::Calendar)?;
    let year = aggregate_calendar(sessions, input.tz, input.today.year());
    Ok(json!({
        "year": year.year,
        "max_hours": year.max_hours,
        "total_hours": year.total_hours(),
        "days": serde_json::to_value(&year.days)?,
    }))
}

fn heatmap<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::Heatmap)?;
    let mode = input.config.heatmap_average.mode(input.date_span(sessions));
    let heatmap = aggregate_heatmap(sessions, input.tz, mode);
    Ok(json!({
        "max_average": heatmap.max_average(),
        "total_hours": heatmap.total_hours(),
        "cells": serde_json::to_value(heatmap.cells())?,
    }))
}

fn histogram<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let sessions = input.sessions(ChartKind::Histogram)?;
    let buckets = duration_histogram(sessions);
    let total = sessions.len();
    let rows: Vec<Value> = buckets
        .iter()
        .map(|bucket| {
            json!({
                "label": bucket.label,
                "count": bucket.count,
                "share": bucket.share(total),
            })
        })
        .collect();
    Ok(json!({ "sessions": total, "buckets": rows }))
}

// ========== Comparison ==========

/// Project stats records, or stats derived from sessions.
fn radar<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let projects: Vec<ProjectMetrics> = match input.data {
        ChartData::Sessions(sessions) => project_metrics(sessions, input.tz, input.today),
        _ => input.records(ChartKind::Radar)?,
    };
    Ok(json!({
        "axes": RADAR_AXES,
        "profiles": serde_json::to_value(radar_profiles(projects))?,
    }))
}

fn status<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let tallies: Vec<StatusTally> = input.records(ChartKind::Status)?;
    Ok(serde_json::to_value(status_breakdown(&tallies))?)
}

fn context<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let totals: Vec<EntityTotal> = input.records(ChartKind::Context)?;
    Ok(serde_json::to_value(context_totals(totals))?)
}

fn bubble<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let tags: Vec<TagTally> = input.records(ChartKind::Bubble)?;
    Ok(serde_json::to_value(tag_bubbles(&tags))?)
}

/// A hierarchy, or flat project totals grouped by context.
fn treemap<Tz: TimeZone>(input: &ChartInput<'_, Tz>) -> Result<Value> {
    let leaves = match input.data {
        ChartData::Tree(tree) => {
            let root = TreeNode::deserialize(tree).context("hierarchy does not fit the treemap chart")?;
            flatten_tree(&root)
        }
        _ => flatten_projects(&input.records::<ContextTotal>(ChartKind::Treemap)?),
    };
    Ok(serde_json::to_value(leaves)?)
}
