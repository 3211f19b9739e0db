//! Render command: turn a session export into chart data.
//!
//! Input is a JSON array of session records (as returned by the sessions
//! endpoint) or of tally records (`{ name, total_time, ... }`, minutes), or a
//! `{ name, children }` hierarchy for the treemap. The output is a JSON
//! envelope with the chart kind, the display timezone, the generation time
//! and the chart data.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use autumn_core::{SeriesKey, Session, ingest_values, local_date};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::charts::{ChartData, ChartInput, ChartKind, ChartRegistry};
use crate::config::Config;

/// What to render and how to filter it.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub kind: Option<ChartKind>,
    pub input: Option<PathBuf>,
    pub project: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Rendered output.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub chart: ChartKind,
    pub timezone: String,
    pub generated_at: DateTime<Utc>,
    /// Session records dropped during ingestion.
    pub rejected: usize,
    pub data: Value,
}

/// Keys that mark an array as session records.
const SESSION_KEYS: [&str; 2] = ["start_time", "start"];

/// Reads the input file, or stdin when no path is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Parses input text into chart data. Blank input is an empty session list.
///
/// An array is session records when any element carries a start time. Each
/// session record is decoded on its own, so a malformed one is rejected
/// without failing the rest. Returns the data and the number of rejected
/// session records.
pub fn load_records<Tz: TimeZone>(text: &str, tz: &Tz) -> Result<(ChartData, usize)> {
    if text.trim().is_empty() {
        return Ok((ChartData::Sessions(Vec::new()), 0));
    }

    let input: Value = serde_json::from_str(text).context("input is not valid JSON")?;
    match input {
        Value::Array(records) if records.is_empty() || records.iter().any(is_session_record) => {
            let ingested = ingest_values(records, tz);
            Ok((ChartData::Sessions(ingested.sessions), ingested.rejected.len()))
        }
        Value::Array(records) => Ok((ChartData::Records(records), 0)),
        tree @ Value::Object(_) if tree.get("children").is_some() => Ok((ChartData::Tree(tree), 0)),
        _ => bail!("input is neither a list of records nor a hierarchy with children"),
    }
}

fn is_session_record(record: &Value) -> bool {
    SESSION_KEYS.iter().any(|key| record.get(key).is_some())
}

/// Keeps sessions of `project` that start within `[from, to]` in `tz`.
fn filter_sessions<Tz: TimeZone>(
    sessions: Vec<Session>,
    project: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    tz: &Tz,
) -> Vec<Session> {
    let before = sessions.len();
    let kept: Vec<Session> = sessions
        .into_iter()
        .filter(|s| project.is_none_or(|p| s.project() == p))
        .filter(|s| {
            let day = local_date(s.start_time(), tz);
            from.is_none_or(|from| day >= from) && to.is_none_or(|to| day <= to)
        })
        .collect();
    tracing::debug!(before, after = kept.len(), ?project, ?from, ?to, "filtered sessions");
    kept
}

/// Builds the envelope for `request` from already-read input text.
pub fn render<Tz: TimeZone>(
    registry: &ChartRegistry<Tz>,
    config: &Config,
    tz: &Tz,
    request: &RenderRequest,
    text: &str,
    now: DateTime<Utc>,
) -> Result<Envelope> {
    let Some(requested) = request.kind else {
        bail!("no chart kind given");
    };
    if let (Some(from), Some(to)) = (request.from, request.to) {
        if from > to {
            bail!("--from {from} is after --to {to}");
        }
    }

    let (data, rejected) = load_records(text, tz)?;
    let filtering = request.project.is_some() || request.from.is_some() || request.to.is_some();
    let data = match data {
        ChartData::Sessions(sessions) => ChartData::Sessions(filter_sessions(
            sessions,
            request.project.as_deref(),
            request.from,
            request.to,
            tz,
        )),
        other if filtering && !other.is_empty() => {
            bail!("--project, --from and --to need session records");
        }
        other => other,
    };

    let (kind, key) = if request.project.is_some() {
        (requested.for_project(), SeriesKey::Subproject)
    } else {
        (requested, SeriesKey::Project)
    };

    let input = ChartInput {
        data: &data,
        tz,
        config,
        today: now.with_timezone(tz).date_naive(),
        range: request.from.zip(request.to),
        key,
    };
    let data = registry.build(kind, &input)?;

    Ok(Envelope {
        chart: kind,
        timezone: config.timezone.name(),
        generated_at: now,
        rejected,
        data,
    })
}

/// Renders the requested chart and prints it as pretty JSON.
pub fn run<Tz: TimeZone>(
    registry: &ChartRegistry<Tz>,
    config: &Config,
    tz: &Tz,
    request: &RenderRequest,
) -> Result<()> {
    let text = read_input(request.input.as_deref())?;
    let envelope = render(registry, config, tz, request, &text, Utc::now())?;
    if envelope.rejected > 0 {
        tracing::warn!(rejected = envelope.rejected, "some session records were skipped");
    }
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
