//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::charts::ChartKind;

/// Chart data from Autumn session exports.
///
/// Reads session records as JSON and prints chart-ready aggregates.
#[derive(Debug, Parser)]
#[command(name = "autumn", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Aggregate sessions into data for one chart.
    Render {
        /// Chart kind (see `autumn kinds`).
        kind: ChartKind,

        /// JSON file with session records or project totals; stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Only include sessions of this project, broken down by subproject.
        #[arg(short, long)]
        project: Option<String>,

        /// First day to include (YYYY-MM-DD, display timezone).
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD, display timezone).
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List the available chart kinds.
    Kinds,

    /// Print the time-axis unit for a range.
    Unit {
        /// Range start timestamp.
        start: String,

        /// Range end timestamp.
        end: String,
    },
}
