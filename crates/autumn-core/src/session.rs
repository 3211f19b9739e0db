//! Session records and the ingestion boundary.
//!
//! The server delivers sessions in a loose shape: `project` may be a plain
//! string or a `{ "name": ... }` object, subprojects likewise, and active
//! sessions have no end time. [`ingest`] normalizes that into [`Session`]
//! values whose interval is known to be well-formed. Everything downstream
//! works only with [`Session`].

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::{duration_hours, duration_ms};
use crate::error::{IngestError, TimestampError, ValidationError};

/// Naive datetime layouts accepted when a timestamp carries no offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A name given either as a bare string or as an object with a `name` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NameRef {
    Plain(String),
    Named { name: String },
}

impl NameRef {
    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Plain(name) | Self::Named { name } => name,
        }
    }

    /// Consumes the reference, returning the owned name.
    pub fn into_name(self) -> String {
        match self {
            Self::Plain(name) | Self::Named { name } => name,
        }
    }
}

/// A session record as delivered by the sessions endpoint.
///
/// Both the full (`start_time`, `project`, ...) and the compact
/// (`start`, `p`, `subs`, ...) field names are accepted.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSession {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(alias = "start")]
    pub start_time: String,
    #[serde(default, alias = "end")]
    pub end_time: Option<String>,
    #[serde(alias = "p")]
    pub project: NameRef,
    #[serde(default, alias = "subs")]
    pub subprojects: Vec<NameRef>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RawSession {
    /// Converts the raw record into a validated [`Session`].
    ///
    /// Offset-less timestamps are read as wall-clock time in `tz`.
    pub fn into_session<Tz: TimeZone>(self, tz: &Tz) -> Result<Session, IngestError> {
        let end_raw = self.end_time.ok_or(IngestError::OpenSession)?;
        let start = parse_timestamp(&self.start_time, tz)?;
        let end = parse_timestamp(&end_raw, tz)?;

        let subprojects = self
            .subprojects
            .into_iter()
            .map(NameRef::into_name)
            .filter(|name| !name.is_empty())
            .collect();

        let session = Session::new(start, end, self.project.into_name())?
            .with_subprojects(subprojects)
            .with_note(self.note.filter(|n| !n.is_empty()));
        Ok(session)
    }
}

/// One logged interval of work.
///
/// Invariant: `end_time >= start_time`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    project: String,
    subprojects: Vec<String>,
    note: Option<String>,
}

impl Session {
    /// Creates a session after validating the interval and project name.
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        project: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let project = project.into();
        if project.is_empty() {
            return Err(ValidationError::Empty { field: "project" });
        }
        if end_time < start_time {
            return Err(ValidationError::EndBeforeStart {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            project,
            subprojects: Vec::new(),
            note: None,
        })
    }

    #[must_use]
    pub fn with_subprojects(mut self, subprojects: Vec<String>) -> Self {
        self.subprojects = subprojects;
        self
    }

    #[must_use]
    pub fn with_note(mut self, note: Option<String>) -> Self {
        self.note = note;
        self
    }

    pub const fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub const fn end_time(&self) -> DateTime<Utc> {
        self.end_time
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn subprojects(&self) -> &[String] {
        &self.subprojects
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Exact session length in milliseconds (never negative).
    pub fn duration_ms(&self) -> i64 {
        duration_ms(&self.start_time, &self.end_time)
    }

    /// Session length in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        duration_hours(&self.start_time, &self.end_time)
    }
}

/// A raw record that could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Position in the input array.
    pub index: usize,
    /// Record ID, when the server supplied one.
    pub id: Option<serde_json::Value>,
    pub reason: IngestError,
}

/// Result of an ingestion pass.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub sessions: Vec<Session>,
    pub rejected: Vec<Rejected>,
}

/// Normalizes raw records into sessions.
///
/// Never fails as a whole: records that are still open, have unparseable
/// timestamps, or end before they start are collected in
/// [`Ingested::rejected`] and logged.
pub fn ingest<Tz: TimeZone>(raw: Vec<RawSession>, tz: &Tz) -> Ingested {
    collect_sessions(raw.into_iter().map(Ok), tz)
}

/// Like [`ingest`], for records that have not been given a shape yet.
///
/// A value that does not deserialize as a [`RawSession`] (missing start
/// time, `null` project, not an object) is rejected as
/// [`IngestError::Malformed`] instead of failing the batch.
pub fn ingest_values<Tz: TimeZone>(values: Vec<serde_json::Value>, tz: &Tz) -> Ingested {
    let records = values.into_iter().map(|value| {
        let id = value.get("id").cloned();
        serde_json::from_value::<RawSession>(value)
            .map_err(|err| (id, IngestError::Malformed(err.to_string())))
    });
    collect_sessions(records, tz)
}

type Unparsed = (Option<serde_json::Value>, IngestError);

fn collect_sessions<Tz: TimeZone>(
    records: impl Iterator<Item = Result<RawSession, Unparsed>>,
    tz: &Tz,
) -> Ingested {
    let mut ingested = Ingested::default();

    for (index, record) in records.enumerate() {
        let converted = record.and_then(|raw| {
            let id = raw.id.clone();
            raw.into_session(tz).map_err(|reason| (id, reason))
        });
        match converted {
            Ok(session) => ingested.sessions.push(session),
            Err((id, reason)) => {
                tracing::warn!(index, id = ?id, %reason, "rejected session record");
                ingested.rejected.push(Rejected { index, id, reason });
            }
        }
    }

    tracing::debug!(
        accepted = ingested.sessions.len(),
        rejected = ingested.rejected.len(),
        "ingested sessions"
    );
    ingested
}

/// Parses an RFC 3339 timestamp, or a naive ISO datetime read in `tz`.
///
/// Ambiguous wall-clock times (DST fall-back) resolve to the earlier instant;
/// times inside a DST gap move forward one hour.
pub fn parse_timestamp<Tz: TimeZone>(value: &str, tz: &Tz) -> Result<DateTime<Utc>, TimestampError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| TimestampError(value.to_string()))?;

    resolve_local(&naive, tz).ok_or_else(|| TimestampError(value.to_string()))
}

fn resolve_local<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt.with_timezone(&Utc)),
        LocalResult::None => {
            let shifted = *naive + chrono::Duration::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawSession {
        serde_json::from_value(value).unwrap()
    }

    // ========== NameRef ==========

    #[test]
    fn test_project_as_plain_string() {
        let record = raw(json!({
            "start_time": "2025-01-15T09:00:00Z",
            "end_time": "2025-01-15T10:00:00Z",
            "project": "autumn"
        }));
        assert_eq!(record.project.as_str(), "autumn");
    }

    #[test]
    fn test_project_as_named_object() {
        let record = raw(json!({
            "start_time": "2025-01-15T09:00:00Z",
            "end_time": "2025-01-15T10:00:00Z",
            "project": {"name": "autumn", "id": 4},
            "subprojects": [{"name": "api"}, "frontend"]
        }));
        let session = record.into_session(&Utc).unwrap();
        assert_eq!(session.project(), "autumn");
        assert_eq!(session.subprojects(), ["api", "frontend"]);
    }

    #[test]
    fn test_compact_field_names() {
        let record = raw(json!({
            "id": 12,
            "p": "autumn",
            "subs": ["cli"],
            "start": "2025-01-15T09:00:00+00:00",
            "end": "2025-01-15T09:30:00+00:00",
            "active": false,
            "elapsed": 30.0
        }));
        let session = record.into_session(&Utc).unwrap();
        assert_eq!(session.duration_ms(), 30 * 60 * 1000);
        assert_eq!(session.subprojects(), ["cli"]);
    }

    // ========== Session validation ==========

    #[test]
    fn test_session_rejects_reversed_interval() {
        let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap();
        let err = Session::new(start, end, "autumn").unwrap_err();
        assert_eq!(err, ValidationError::EndBeforeStart { start, end });
    }

    #[test]
    fn test_session_rejects_empty_project() {
        let t = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let err = Session::new(t, t, "").unwrap_err();
        assert_eq!(err.to_string(), "project cannot be empty");
    }

    #[test]
    fn test_zero_duration_session_is_valid() {
        let t = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
        let session = Session::new(t, t, "autumn").unwrap();
        assert_eq!(session.duration_ms(), 0);
    }

    // ========== Timestamp parsing ==========

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_timestamp("2025-01-15T10:00:00+02:00", &Utc).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_uses_display_timezone() {
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let dt = parse_timestamp("2025-01-15T10:00:00", &tz).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 15, 5, 0, 0).unwrap());

        let spaced = parse_timestamp("2025-01-15 10:00:00.250", &tz).unwrap();
        assert_eq!(spaced.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parse_garbage_fails() {
        let err = parse_timestamp("yesterday-ish", &Utc).unwrap_err();
        assert_eq!(err.to_string(), "invalid timestamp: yesterday-ish");
    }

    // ========== Ingestion ==========

    #[test]
    fn test_ingest_collects_rejections() {
        let records = vec![
            raw(json!({
                "id": 1,
                "start_time": "2025-01-15T09:00:00Z",
                "end_time": "2025-01-15T10:00:00Z",
                "project": "ok"
            })),
            raw(json!({
                "id": 2,
                "start_time": "2025-01-15T09:00:00Z",
                "end_time": null,
                "project": "running"
            })),
            raw(json!({
                "id": 3,
                "start_time": "2025-01-15T11:00:00Z",
                "end_time": "2025-01-15T10:00:00Z",
                "project": "reversed"
            })),
            raw(json!({
                "start_time": "not a date",
                "end_time": "2025-01-15T10:00:00Z",
                "project": "broken"
            })),
        ];

        let ingested = ingest(records, &Utc);

        assert_eq!(ingested.sessions.len(), 1);
        assert_eq!(ingested.sessions[0].project(), "ok");

        let reasons: Vec<_> = ingested
            .rejected
            .iter()
            .map(|r| (r.index, r.reason.clone()))
            .collect();
        assert_eq!(reasons[0], (1, IngestError::OpenSession));
        assert!(matches!(
            reasons[1],
            (2, IngestError::Invalid(ValidationError::EndBeforeStart { .. }))
        ));
        assert!(matches!(reasons[2], (3, IngestError::Timestamp(_))));
        assert_eq!(ingested.rejected[0].id, Some(json!(2)));
    }

    #[test]
    fn test_ingest_values_rejects_malformed_records() {
        let values = vec![
            json!({
                "id": 7,
                "start_time": "2025-01-15T09:00:00Z",
                "end_time": "2025-01-15T09:45:00Z",
                "project": "ok"
            }),
            json!({
                "id": 8,
                "start_time": "2025-01-15T10:00:00Z",
                "end_time": "2025-01-15T11:00:00Z",
                "project": null
            }),
            json!({"end_time": "2025-01-15T11:00:00Z", "project": "no start"}),
            json!("not an object"),
        ];

        let ingested = ingest_values(values, &Utc);

        assert_eq!(ingested.sessions.len(), 1);
        assert_eq!(ingested.sessions[0].project(), "ok");
        let indexes: Vec<_> = ingested.rejected.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![1, 2, 3]);
        assert!(
            ingested
                .rejected
                .iter()
                .all(|r| matches!(r.reason, IngestError::Malformed(_)))
        );
        assert_eq!(ingested.rejected[0].id, Some(json!(8)));
        assert_eq!(ingested.rejected[2].id, None);
    }

    #[test]
    fn test_ingest_empty_input() {
        let ingested = ingest(Vec::new(), &Utc);
        assert!(ingested.sessions.is_empty());
        assert!(ingested.rejected.is_empty());
    }

    #[test]
    fn test_empty_note_dropped() {
        let record = raw(json!({
            "start_time": "2025-01-15T09:00:00Z",
            "end_time": "2025-01-15T10:00:00Z",
            "project": "autumn",
            "note": ""
        }));
        assert_eq!(record.into_session(&Utc).unwrap().note(), None);
    }
}
