//! CLI subcommand implementations.

pub mod kinds;
pub mod render;
pub mod unit;
