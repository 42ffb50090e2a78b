//! Named units of cleanup work.
//!
//! A [`CleanTask`] is a label plus an async function from options to a
//! partial result. Category tasks resolve their targets and run them one
//! after another through the [`Sweeper`], emitting every outcome to the
//! pool's [`ResultSink`] as it completes.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::process::Stdio;
use std::sync::Arc;

use super::categories::{Category, Target};
use super::error::{CleanError, ErrorKind};
use super::options::CleanOptions;
use super::paths::PathSource;
use super::result::{CleanResult, ResultSink};
use super::sweeper::Sweeper;

type TaskFn = Arc<dyn Fn(Arc<CleanOptions>, ResultSink) -> BoxFuture<'static, CleanResult> + Send + Sync>;

/// A named unit of work handed to the worker pool.
#[derive(Clone)]
pub struct CleanTask {
    name: String,
    run: TaskFn,
}

impl CleanTask {
    /// Wrap `run`. Work it emits to the sink is counted even if the task is
    /// later cut off; the returned result is emitted once it finishes.
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<CleanOptions>, ResultSink) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CleanResult> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Arc::new(move |opts, sink| run(opts, sink).boxed()),
        }
    }

    /// Task that cleans one category.
    pub fn for_category(category: Category, paths: Arc<dyn PathSource>, sweeper: Sweeper) -> Self {
        Self::new(category.label(), move |opts: Arc<CleanOptions>, sink: ResultSink| {
            let paths = Arc::clone(&paths);
            let sweeper = sweeper.clone();
            async move {
                run_category(category, paths, &sweeper, opts.dry_run, &sink).await;
                CleanResult::new()
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run(&self, opts: Arc<CleanOptions>, sink: ResultSink) -> BoxFuture<'static, CleanResult> {
        (self.run)(opts, sink)
    }
}

impl std::fmt::Debug for CleanTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleanTask").field("name", &self.name).finish()
    }
}

/// One task per enabled category, in table order.
pub fn build_tasks(opts: &CleanOptions, paths: &Arc<dyn PathSource>, sweeper: &Sweeper) -> Vec<CleanTask> {
    opts.categories
        .iter()
        .map(|&category| CleanTask::for_category(category, Arc::clone(paths), sweeper.clone()))
        .collect()
}

/// Resolve a category's targets and clean each of them into `sink`.
pub async fn run_category(
    category: Category,
    paths: Arc<dyn PathSource>,
    sweeper: &Sweeper,
    dry_run: bool,
    sink: &ResultSink,
) {
    // Resolution may list directories, keep it off the async workers
    let targets = match tokio::task::spawn_blocking(move || category.targets(paths.as_ref())).await {
        Ok(targets) => targets,
        Err(e) => {
            sink.emit(CleanResult::from_error(CleanError::other(
                category.label(),
                format!("resolving targets failed: {e}"),
            )));
            return;
        }
    };

    if targets.is_empty() {
        tracing::debug!(category = category.key(), "no targets on this system");
        return;
    }

    for target in &targets {
        execute(target, sweeper, dry_run, sink).await;
    }
}

/// Clean a single target.
pub async fn execute(target: &Target, sweeper: &Sweeper, dry_run: bool, sink: &ResultSink) {
    match target {
        Target::Dir { path, max_age } => sweeper.sweep_into(path, *max_age, dry_run, sink).await,
        Target::File(path) => sink.emit(sweeper.remove_file(path, dry_run).await),
        Target::Command { program, args } => sink.emit(run_command(program, args, dry_run).await),
    }
}

async fn run_command(program: &str, args: &[&str], dry_run: bool) -> CleanResult {
    if dry_run {
        tracing::debug!(program, "dry run, command not executed");
        return CleanResult::new();
    }

    let output = tokio::process::Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match output {
        Ok(out) if out.status.success() => {
            tracing::info!(program, ?args, "command completed");
            CleanResult::new()
        }
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr);
            CleanResult::from_error(CleanError::other(
                program,
                format!("{} {} exited with {}: {}", program, args.join(" "), out.status, stderr.trim()),
            ))
        }
        // A command that cannot start is reported whatever the io kind
        Err(e) => CleanResult::from_error(CleanError::new(program, ErrorKind::Other, e)),
    }
}
