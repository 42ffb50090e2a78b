//! Fixed-size worker pool for category tasks.
//!
//! Tasks are queued up front; `min(tasks, max_workers)` workers drain the
//! queue. Tasks push partial [`CleanResult`]s into one shared channel as work
//! completes, so a category cut off by its deadline keeps what it already
//! did. The channel closes once every worker and sweep has let go of it.
//! Dropping the [`Dispatch`] aborts any worker still running.

use crossbeam_channel::{unbounded, Receiver};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::error::CleanError;
use super::limits::{CATEGORY_TIMEOUT, MAX_WORKERS};
use super::options::CleanOptions;
use super::result::{drain, CleanResult, ResultSink};
use super::task::CleanTask;

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    max_workers: usize,
    category_timeout: Duration,
}

impl WorkerPool {
    pub fn new(max_workers: usize, category_timeout: Duration) -> Self {
        Self {
            max_workers: max_workers.max(1),
            category_timeout,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Start workers for `tasks`. Must be called inside a tokio runtime.
    pub fn dispatch(&self, tasks: Vec<CleanTask>, opts: Arc<CleanOptions>) -> Dispatch {
        let workers = tasks.len().min(self.max_workers);
        let (queue_tx, queue) = unbounded();
        for task in tasks {
            // Receiver is alive, send cannot fail
            let _ = queue_tx.send(task);
        }
        drop(queue_tx);

        let (sink, rx) = ResultSink::channel();
        let mut set = JoinSet::new();
        for id in 0..workers {
            let queue = queue.clone();
            let sink = sink.clone();
            let opts = Arc::clone(&opts);
            let timeout = self.category_timeout;
            set.spawn(async move {
                worker_loop(id, queue, sink, opts, timeout).await;
            });
        }
        tracing::debug!(workers, "worker pool started");

        Dispatch { rx, workers: set }
    }

    /// Run every task to completion and merge the results.
    pub async fn run_all(&self, tasks: Vec<CleanTask>, opts: Arc<CleanOptions>) -> CleanResult {
        let mut dispatch = self.dispatch(tasks, opts);
        let mut total = CleanResult::new();
        while let Some(result) = dispatch.next().await {
            total.merge(result);
        }
        total
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(MAX_WORKERS, CATEGORY_TIMEOUT)
    }
}

/// Handle on a running set of workers.
pub struct Dispatch {
    rx: mpsc::UnboundedReceiver<CleanResult>,
    workers: JoinSet<()>,
}

impl Dispatch {
    /// Next partial result, or `None` once every producer has finished.
    pub async fn next(&mut self) -> Option<CleanResult> {
        self.rx.recv().await
    }

    /// Abort every worker still running and merge whatever was already sent.
    pub fn cancel(&mut self) -> CleanResult {
        self.workers.abort_all();
        drain(&mut self.rx)
    }
}

async fn worker_loop(
    id: usize,
    queue: Receiver<CleanTask>,
    sink: ResultSink,
    opts: Arc<CleanOptions>,
    timeout: Duration,
) {
    while let Ok(task) = queue.try_recv() {
        run_task(&task, &opts, timeout, &sink).await;
        if sink.is_closed() {
            tracing::debug!(worker = id, "result receiver gone, worker exiting");
            break;
        }
    }
}

async fn run_task(task: &CleanTask, opts: &Arc<CleanOptions>, timeout: Duration, sink: &ResultSink) {
    let name = task.name();
    let started = Instant::now();
    opts.report_progress(name, 0, 100);
    tracing::info!(category = name, "cleaning started");

    let run = AssertUnwindSafe(task.run(Arc::clone(opts), sink.clone())).catch_unwind();
    match tokio::time::timeout(timeout, run).await {
        Ok(Ok(rest)) => {
            sink.emit(rest);
            opts.report_progress(name, 100, 100);
            tracing::info!(
                category = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "cleaning finished"
            );
        }
        Ok(Err(_)) => {
            tracing::warn!(category = name, "category task panicked");
            sink.emit(CleanResult::from_error(CleanError::other(name, "category task panicked")));
        }
        Err(_) => {
            // Work emitted before expiry stays counted
            tracing::warn!(category = name, "category cleanup timed out after {:?}", timeout);
            sink.emit(CleanResult::from_error(CleanError::timed_out(name, "cleaning")));
        }
    }
}
