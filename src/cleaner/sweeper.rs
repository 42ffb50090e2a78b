//! Directory sweeping under a per-directory deadline.
//!
//! A sweep walks one directory tree, filters files by age and either measures
//! them (dry-run) or hands them to the [`BoundedRemover`]. The walk itself is
//! blocking and runs on tokio's blocking pool; the async side only races it
//! against the directory deadline. Every file outcome is emitted to a
//! [`ResultSink`] as soon as it is known.

use jwalk::{Parallelism, WalkDir};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use super::error::{classify, CleanError, ErrorKind};
use super::remover::BoundedRemover;
use super::result::{CleanResult, ResultSink};

/// Default per-directory deadline.
pub const DIR_TIMEOUT: Duration = Duration::from_secs(30);

/// Sweeps directories and singleton files.
#[derive(Clone)]
pub struct Sweeper {
    remover: BoundedRemover,
    dir_timeout: Duration,
}

impl Sweeper {
    pub fn new(remover: BoundedRemover, dir_timeout: Duration) -> Self {
        Self {
            remover,
            dir_timeout,
        }
    }

    /// Sweep every regular file under `dir` and merge the outcome.
    pub async fn sweep(&self, dir: &Path, max_age: Duration, dry_run: bool) -> CleanResult {
        ResultSink::collect(|sink| async move { self.sweep_into(dir, max_age, dry_run, &sink).await }).await
    }

    /// Sweep every regular file under `dir`, emitting each outcome to `sink`.
    ///
    /// `max_age` of zero disables the age filter. A missing directory emits
    /// nothing. If the deadline expires the walk is abandoned, files already
    /// handled stay reported and a single timeout error for `dir` is added.
    pub async fn sweep_into(&self, dir: &Path, max_age: Duration, dry_run: bool, sink: &ResultSink) {
        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::debug!(path = %dir.display(), "not a directory, nothing to sweep");
                return;
            }
            Err(e) => {
                let err = classify(dir, e);
                if err.kind.is_skip() || err.kind == ErrorKind::NotFound {
                    tracing::debug!(path = %dir.display(), kind = ?err.kind, "sweep target unavailable");
                    return;
                }
                sink.emit(CleanResult::from_error(err));
                return;
            }
        }

        let abandoned = Arc::new(AtomicBool::new(false));
        // Also covers the sweep future being dropped by an outer deadline
        let _guard = AbandonOnDrop(Arc::clone(&abandoned));
        let job = {
            let remover = self.remover.clone();
            let root = dir.to_path_buf();
            let abandoned = Arc::clone(&abandoned);
            let sink = sink.clone();
            tokio::task::spawn_blocking(move || {
                walk_and_remove(&root, max_age, dry_run, &remover, &abandoned, &sink)
            })
        };

        match tokio::time::timeout(self.dir_timeout, job).await {
            Ok(Ok(())) => {}
            Ok(Err(join_err)) => sink.emit(CleanResult::from_error(CleanError::other(
                dir,
                format!("sweep worker failed: {join_err}"),
            ))),
            Err(_) => {
                abandoned.store(true, Ordering::Relaxed);
                tracing::warn!(path = %dir.display(), "directory cleanup timed out after {:?}", self.dir_timeout);
                sink.emit(CleanResult::from_error(CleanError::timed_out(dir, "cleaning")));
            }
        }
    }

    /// Remove a single file target, routing the outcome like a sweep would.
    pub async fn remove_file(&self, path: &Path, dry_run: bool) -> CleanResult {
        let mut result = CleanResult::new();

        let size = match tokio::fs::symlink_metadata(path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return result,
            Err(e) => {
                result.record_failure(classify(path, e));
                return result;
            }
        };

        if dry_run {
            result.record_deleted(size);
            return result;
        }

        let remover = self.remover.clone();
        let target = path.to_path_buf();
        match tokio::task::spawn_blocking(move || remover.remove(&target)).await {
            Ok(Ok(())) => result.record_deleted(size),
            Ok(Err(err)) => result.record_failure(err),
            Err(join_err) => result
                .errors
                .push(CleanError::other(path, format!("remove worker failed: {join_err}"))),
        }
        result
    }
}

impl Default for Sweeper {
    fn default() -> Self {
        Self::new(BoundedRemover::default(), DIR_TIMEOUT)
    }
}

struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// True if a file last modified at `modified` is old enough to remove.
pub fn is_eligible(modified: Option<SystemTime>, now: SystemTime, max_age: Duration) -> bool {
    if max_age.is_zero() {
        return true;
    }
    modified
        .and_then(|m| now.duration_since(m).ok())
        .is_some_and(|age| age >= max_age)
}

fn walk_and_remove(
    root: &Path,
    max_age: Duration,
    dry_run: bool,
    remover: &BoundedRemover,
    abandoned: &AtomicBool,
    sink: &ResultSink,
) {
    let now = SystemTime::now();
    let (mut files, mut skipped) = (0u64, 0u64);

    for entry_result in WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .skip_hidden(false)
        .follow_links(false)
        .sort(false)
    {
        if abandoned.load(Ordering::Relaxed) || sink.is_closed() {
            tracing::debug!(path = %root.display(), "sweep abandoned, stopping walk");
            break;
        }

        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                match e.io_error().map(io::Error::kind) {
                    Some(io::ErrorKind::NotFound) => {}
                    Some(io::ErrorKind::PermissionDenied) => {
                        tracing::debug!(path = %path.display(), "skipping inaccessible entry");
                    }
                    _ => sink.emit(CleanResult::from_error(CleanError::other(
                        path,
                        format!("walk error: {e}"),
                    ))),
                }
                continue;
            }
        };

        if let Some(err) = &entry.read_children_error {
            // Contents of this directory are not visited; keep walking siblings
            tracing::debug!(path = %entry.path().display(), "skipping inaccessible directory: {err}");
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                if e.io_error().map(io::Error::kind) != Some(io::ErrorKind::NotFound) {
                    sink.emit(CleanResult::from_error(CleanError::other(
                        &path,
                        format!("stat failed: {e}"),
                    )));
                }
                continue;
            }
        };

        if !is_eligible(meta.modified().ok(), now, max_age) {
            continue;
        }

        let mut outcome = CleanResult::new();
        if dry_run {
            outcome.record_deleted(meta.len());
        } else {
            match remover.remove(&path) {
                Ok(()) => outcome.record_deleted(meta.len()),
                Err(err) => {
                    tracing::debug!(path = %path.display(), kind = ?err.kind, "file skipped");
                    outcome.record_failure(err);
                }
            }
        }
        files += outcome.files_deleted;
        skipped += outcome.skipped_files;
        sink.emit(outcome);
    }

    tracing::debug!(path = %root.display(), files, skipped, "directory swept");
}
