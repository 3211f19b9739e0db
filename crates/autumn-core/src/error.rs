//! Error types for session ingestion.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Validation errors for session records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The interval is reversed.
    #[error("session ends before it starts ({end} < {start})")]
    EndBeforeStart {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// A timestamp string that matched none of the accepted formats.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid timestamp: {0}")]
pub struct TimestampError(pub String);

/// Why a raw record was rejected at ingestion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The session is still running and has no end time.
    #[error("session has no end time")]
    OpenSession,

    /// The record does not have the session shape.
    #[error("malformed session record: {0}")]
    Malformed(String),

    #[error(transparent)]
    Timestamp(#[from] TimestampError),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
