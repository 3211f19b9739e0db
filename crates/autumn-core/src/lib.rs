//! Aggregation core for the Autumn time-tracking dashboard.
//!
//! This crate turns logged work sessions into chart-ready data:
//! - Ingestion: normalizing loosely shaped session records
//! - Calendar and heatmap: day totals for a year, weekday × hour averages
//! - Series: per-project and per-subproject point and daily series
//! - Ranking: top-N consolidation with an "Other" bucket
//! - Comparison: radar, status, context, tag and treemap data from tallies
//!
//! Nothing here does I/O; the CLI crate reads input and renders output.

pub mod calendar;
pub mod compare;
pub mod cumulative;
pub mod dates;
mod duration;
pub mod error;
mod format;
pub mod heatmap;
pub mod hierarchy;
pub mod histogram;
pub mod series;
pub mod session;
pub mod topn;
pub mod unit;

pub use calendar::{CalendarDay, CalendarYear, aggregate_calendar};
pub use compare::{
    Bubble, ContextBar, ProjectMetrics, RADAR_AXES, RADAR_TOP_N, RadarProfile, STATUS_ORDER,
    StatusSlice, StatusTally, TagTally, context_totals, project_metrics, radar_profiles,
    status_breakdown, tag_bubbles,
};
pub use cumulative::{CumulativePoint, cumulative_series};
pub use dates::{count_weekdays, fill_dates, local_date, weekday_index};
pub use duration::{MS_PER_DAY, MS_PER_HOUR, duration_hours, duration_ms, ms_to_hours};
pub use error::{IngestError, TimestampError, ValidationError};
pub use format::format_hours;
pub use heatmap::{
    AverageMode, Heatmap, HeatmapCell, HourBlock, HourBlocks, aggregate_heatmap, split_hour_blocks,
};
pub use hierarchy::{
    ContextTotal, DEFAULT_GROUP, TreeNode, TreemapLeaf, flatten_projects, flatten_tree,
};
pub use histogram::{HistogramBucket, duration_histogram};
pub use series::{
    AxisValue, DailyOptions, Fill, NO_SUBPROJECT, NamedSeries, Point, SeriesKey, SeriesLabel,
    daily_series, group_ranked_series, group_series, series_time_unit,
};
pub use session::{
    Ingested, NameRef, RawSession, Rejected, Session, ingest, ingest_values, parse_timestamp,
};
pub use topn::{DEFAULT_TOP_N, EntityTotal, OTHER_LABEL, Ranked, consolidate_top_n};
pub use unit::{TimeUnit, UnknownTimeUnit, choose_unit};
