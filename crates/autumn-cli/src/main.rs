use anyhow::{Context, Result};
use chrono::{Local, TimeZone, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use autumn_cli::commands::{kinds, render, unit};
use autumn_cli::{ChartRegistry, Cli, Commands, Config, DisplayTimezone};

/// Runs the parsed command with charts keyed in `tz`.
fn dispatch<Tz: TimeZone>(cli: &Cli, config: &Config, tz: &Tz) -> Result<()> {
    let registry = ChartRegistry::<Tz>::standard();

    match &cli.command {
        Some(Commands::Render {
            kind,
            input,
            project,
            from,
            to,
        }) => {
            let request = render::RenderRequest {
                kind: Some(*kind),
                input: input.clone(),
                project: project.clone(),
                from: *from,
                to: *to,
            };
            render::run(&registry, config, tz, &request)?;
        }
        Some(Commands::Kinds) => {
            kinds::run(&registry)?;
        }
        Some(Commands::Unit { start, end }) => {
            unit::run(start, end, tz)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Logs go to stderr so stdout stays valid JSON
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    match config.timezone {
        DisplayTimezone::Local => dispatch(&cli, &config, &Local),
        DisplayTimezone::Utc => dispatch(&cli, &config, &Utc),
        DisplayTimezone::Fixed(offset) => dispatch(&cli, &config, &offset),
    }
}
