//! Top-level entry point for a cleanup run.

use std::sync::Arc;
use std::time::Instant;

use super::error::CleanError;
use super::limits::{Limits, MAX_WORKERS};
use super::options::CleanOptions;
use super::paths::{PathSource, SystemPaths};
use super::pool::WorkerPool;
use super::remover::{BoundedRemover, Deleter, FsDeleter};
use super::result::CleanResult;
use super::sweeper::Sweeper;
use super::task::{build_tasks, CleanTask};

/// Label used for the error appended when the whole run times out.
pub const RUN_LABEL: &str = "cleanup run";

/// Configured cleanup engine.
///
/// ```no_run
/// use reclaim::cleaner::{Category, CleanOptions, Cleaner};
///
/// # async fn demo() {
/// let opts = CleanOptions::new()
///     .with_categories([Category::UserTemp])
///     .with_dry_run(true);
/// let result = Cleaner::new().perform_clean(opts).await;
/// println!("{} bytes", result.space_freed);
/// # }
/// ```
#[derive(Clone)]
pub struct Cleaner {
    paths: Arc<dyn PathSource>,
    deleter: Arc<dyn Deleter>,
    limits: Limits,
    max_workers: usize,
}

impl Cleaner {
    pub fn new() -> Self {
        Self {
            paths: Arc::new(SystemPaths),
            deleter: Arc::new(FsDeleter),
            limits: Limits::default(),
            max_workers: MAX_WORKERS,
        }
    }

    pub fn with_paths(mut self, paths: impl PathSource + 'static) -> Self {
        self.paths = Arc::new(paths);
        self
    }

    pub fn with_deleter(mut self, deleter: impl Deleter + 'static) -> Self {
        self.deleter = Arc::new(deleter);
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    fn sweeper(&self) -> Sweeper {
        let remover = BoundedRemover::new(Arc::clone(&self.deleter), self.limits.file);
        Sweeper::new(remover, self.limits.dir)
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.max_workers, self.limits.category)
    }

    /// Tasks a run with `opts` would dispatch.
    pub fn tasks(&self, opts: &CleanOptions) -> Vec<CleanTask> {
        build_tasks(opts, &self.paths, &self.sweeper())
    }

    /// Clean every enabled category and return the merged outcome.
    ///
    /// Never fails: per-file problems are counted or listed in the result,
    /// and an expired run deadline still returns whatever finished in time.
    pub async fn perform_clean(&self, opts: CleanOptions) -> CleanResult {
        if opts.is_empty() {
            tracing::debug!("no categories selected, nothing to clean");
            return CleanResult::new();
        }
        let tasks = self.tasks(&opts);
        self.run_tasks(tasks, opts).await
    }

    /// Dispatch arbitrary tasks under this engine's limits.
    pub async fn run_tasks(&self, tasks: Vec<CleanTask>, opts: CleanOptions) -> CleanResult {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.limits.run;
        let task_count = tasks.len();

        tracing::info!(
            categories = task_count,
            dry_run = opts.dry_run,
            workers = self.max_workers.min(task_count),
            "cleanup started"
        );

        let mut dispatch = self.pool().dispatch(tasks, Arc::new(opts));
        let mut total = CleanResult::new();
        loop {
            match tokio::time::timeout_at(deadline, dispatch.next()).await {
                Ok(Some(part)) => total.merge(part),
                Ok(None) => break,
                Err(_) => {
                    // Results sent just before the abort are still in the channel
                    total.merge(dispatch.cancel());
                    tracing::warn!(
                        categories = task_count,
                        files = total.files_deleted,
                        "cleanup run timed out after {:?}",
                        self.limits.run
                    );
                    total.errors.push(CleanError::timed_out(RUN_LABEL, "running"));
                    break;
                }
            }
        }

        total.duration = started.elapsed();
        tracing::info!(
            files = total.files_deleted,
            bytes = total.space_freed,
            skipped = total.skipped_files,
            locked = total.locked_files,
            denied = total.permission_files,
            errors = total.errors.len(),
            elapsed_ms = total.duration.as_millis() as u64,
            "cleanup finished"
        );
        total
    }
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("limits", &self.limits)
            .field("max_workers", &self.max_workers)
            .finish_non_exhaustive()
    }
}

/// Clean with the live environment and default limits.
pub async fn perform_clean(opts: CleanOptions) -> CleanResult {
    Cleaner::new().perform_clean(opts).await
}
