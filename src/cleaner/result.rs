// Aggregate outcome of a cleanup run
// Partial results from sweeps and categories are combined with merge()

use serde::{Serialize, Serializer};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use super::error::{CleanError, ErrorKind};

/// Counters and failures produced by a sweep, a category or a whole run.
///
/// Results are built empty and only ever grow through [`CleanResult::merge`],
/// which is field-wise addition plus list concatenation. That makes merging
/// order-independent, so results coming back from concurrent workers can be
/// folded in whatever order they arrive.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanResult {
    /// Files removed (or, in dry-run, files that would be removed).
    pub files_deleted: u64,
    /// Files left in place because they were locked, timed out or denied.
    pub skipped_files: u64,
    /// Bytes reclaimed.
    pub space_freed: u64,
    /// Skipped because in use or unresponsive.
    pub locked_files: u64,
    /// Skipped because access was denied.
    pub permission_files: u64,
    /// Wall-clock time of the run. Stamped by the orchestrator, not merged.
    #[serde(rename = "duration_ms", serialize_with = "serialize_duration")]
    pub duration: Duration,
    /// Failures that are not counted anywhere else.
    pub errors: Vec<CleanError>,
}

// Helper function to serialize Duration as whole milliseconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl CleanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result carrying a single failure and nothing else.
    pub fn from_error(error: CleanError) -> Self {
        Self {
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Fold `other` into `self`.
    pub fn merge(&mut self, other: CleanResult) {
        self.files_deleted += other.files_deleted;
        self.skipped_files += other.skipped_files;
        self.space_freed += other.space_freed;
        self.locked_files += other.locked_files;
        self.permission_files += other.permission_files;
        self.errors.extend(other.errors);
    }

    /// Consuming variant of [`merge`](Self::merge).
    pub fn merged(mut self, other: CleanResult) -> Self {
        self.merge(other);
        self
    }

    /// Count one removed (or measured) file.
    pub fn record_deleted(&mut self, size: u64) {
        self.files_deleted += 1;
        self.space_freed += size;
    }

    /// Route a failed removal into the matching counter or the error list.
    pub fn record_failure(&mut self, error: CleanError) {
        match error.kind {
            ErrorKind::Locked | ErrorKind::Timeout => {
                self.skipped_files += 1;
                self.locked_files += 1;
            }
            ErrorKind::PermissionDenied => {
                self.skipped_files += 1;
                self.permission_files += 1;
            }
            ErrorKind::NotFound => {}
            ErrorKind::Other => self.errors.push(error),
        }
    }

    /// True when nothing was deleted, skipped or reported.
    pub fn is_empty(&self) -> bool {
        self.files_deleted == 0
            && self.skipped_files == 0
            && self.space_freed == 0
            && self.errors.is_empty()
    }
}

impl std::iter::Sum for CleanResult {
    fn sum<I: Iterator<Item = CleanResult>>(iter: I) -> Self {
        iter.fold(CleanResult::new(), CleanResult::merged)
    }
}

/// Sending half of a result stream.
///
/// Sweeps and tasks emit each finished piece of work as soon as it is known.
/// Work emitted before a deadline abandons its producer is still counted by
/// the single receiver that merges the stream.
#[derive(Debug, Clone)]
pub struct ResultSink(mpsc::UnboundedSender<CleanResult>);

impl ResultSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CleanResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Forward `result` unless it is empty. Lost if the receiver is gone.
    pub fn emit(&self, result: CleanResult) {
        if !result.is_empty() {
            let _ = self.0.send(result);
        }
    }

    /// True once nobody is listening any more.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }

    /// Run `work` against a fresh sink and merge what it emitted.
    pub async fn collect<F, Fut>(work: F) -> CleanResult
    where
        F: FnOnce(ResultSink) -> Fut,
        Fut: Future<Output = ()>,
    {
        let (sink, mut rx) = Self::channel();
        work(sink).await;
        drain(&mut rx)
    }
}

/// Merge everything already waiting in `rx` without blocking.
pub fn drain(rx: &mut mpsc::UnboundedReceiver<CleanResult>) -> CleanResult {
    let mut total = CleanResult::new();
    while let Ok(part) = rx.try_recv() {
        total.merge(part);
    }
    total
}
