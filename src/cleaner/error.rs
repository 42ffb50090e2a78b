// Failure classification for cleanup operations
// Every raw OS error from a stat or delete attempt ends up as exactly one ErrorKind

use serde::{Serialize, Serializer};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Message fragments that identify a file held open by another process.
/// Windows reports sharing violations by text, unix reports EBUSY.
const LOCKED_MARKERS: &[&str] = &[
    "used by another process",
    "locked",
    "sharing violation",
    "resource busy",
];

const TIMEOUT_MARKERS: &[&str] = &["timeout", "timed out"];

/// Actionable category of a cleanup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    /// File is in use by another process.
    Locked,
    /// Access denied.
    PermissionDenied,
    /// File, directory, category or run exceeded its deadline.
    Timeout,
    /// Target vanished between enumeration and deletion.
    NotFound,
    /// Anything else.
    Other,
}

impl ErrorKind {
    /// Whether this kind is counted as a skipped file rather than reported.
    pub fn is_skip(self) -> bool {
        matches!(
            self,
            ErrorKind::Locked | ErrorKind::Timeout | ErrorKind::PermissionDenied
        )
    }
}

/// A classified cleanup failure.
///
/// Created once by [`classify`] (or one of the timeout constructors) and never
/// mutated afterwards. The underlying I/O error is shared so results stay
/// cheap to clone.
#[derive(Debug, Clone, thiserror::Error, Serialize)]
#[error("{}: {source}", .path.display())]
pub struct CleanError {
    pub path: PathBuf,
    pub kind: ErrorKind,
    #[serde(rename = "message", serialize_with = "serialize_source")]
    pub source: Arc<io::Error>,
}

fn serialize_source<S>(source: &Arc<io::Error>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(source)
}

impl CleanError {
    /// Build an error with an explicit kind, bypassing classification.
    pub fn new(path: impl Into<PathBuf>, kind: ErrorKind, source: io::Error) -> Self {
        Self {
            path: path.into(),
            kind,
            source: Arc::new(source),
        }
    }

    /// A deadline expired while working on `target`.
    pub fn timed_out(target: impl Into<PathBuf>, what: &str) -> Self {
        let target = target.into();
        let message = format!("timeout {} {}", what, target.display());
        Self::new(target, ErrorKind::Timeout, io::Error::new(io::ErrorKind::TimedOut, message))
    }

    /// Unclassified failure described only by a message.
    pub fn other(target: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(target, ErrorKind::Other, io::Error::other(message.into()))
    }
}

/// Classify a raw I/O error raised while operating on `path`.
///
/// First match wins: permission denied, not found, lock indicators in the
/// message, timeout indicators, otherwise `Other`.
pub fn classify(path: &Path, err: io::Error) -> CleanError {
    let kind = kind_of(&err);
    CleanError::new(path, kind, err)
}

fn kind_of(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::PermissionDenied => return ErrorKind::PermissionDenied,
        io::ErrorKind::NotFound => return ErrorKind::NotFound,
        _ => {}
    }

    let message = err.to_string().to_lowercase();
    if LOCKED_MARKERS.iter().any(|m| message.contains(m)) {
        ErrorKind::Locked
    } else if err.kind() == io::ErrorKind::TimedOut
        || TIMEOUT_MARKERS.iter().any(|m| message.contains(m))
    {
        ErrorKind::Timeout
    } else {
        ErrorKind::Other
    }
}
