//! Autumn chart data CLI library.
//!
//! This crate provides the CLI interface over `autumn-core`.

pub mod charts;
mod cli;
pub mod commands;
mod config;

pub use charts::{ChartData, ChartFn, ChartInput, ChartKind, ChartRegistry};
pub use cli::{Cli, Commands};
pub use config::{Config, DisplayTimezone, HeatmapAverage};
