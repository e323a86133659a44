use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::warn;

/// Which entity a malformed record belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    User,
    Vehicle,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::User => f.write_str("user"),
            RecordKind::Vehicle => f.write_str("vehicle"),
        }
    }
}

/// The only failure the classification core knows about.
///
/// Missing optional fields are never errors; only a record that breaks the
/// backend contract (no id, no role, unknown enum value) ends up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("malformed {kind} record ({}): {reason}", id.as_deref().unwrap_or("no id"))]
    MalformedRecord {
        kind: RecordKind,
        id: Option<String>,
        reason: String,
    },
}

impl RecordError {
    pub(crate) fn malformed(kind: RecordKind, id: Option<String>, reason: impl Into<String>) -> Self {
        RecordError::MalformedRecord {
            kind,
            id,
            reason: reason.into(),
        }
    }
}

/// Maps a core error onto the handler rejection type.
pub(crate) fn unprocessable(e: RecordError) -> (StatusCode, String) {
    warn!(error = %e, "request carried a malformed record");
    (StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
}
