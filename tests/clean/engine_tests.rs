// Orchestrator and worker pool: selection, progress, deadlines, concurrency bound

use reclaim::cleaner::{
    Category, CleanOptions, CleanResult, CleanTask, Cleaner, ErrorKind, Limits, Platform, ResultSink,
    StaticPaths,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tempfile::TempDir;

use super::common::{list_files, write_file, SlowDeleter};

/// Linux-style environment rooted in a temp directory with a populated TMPDIR.
fn sandbox() -> (TempDir, StaticPaths) {
    let root = TempDir::new().unwrap();
    let tmp = root.path().join("tmp");
    write_file(&tmp.join("a.log"), 100);
    write_file(&tmp.join("sub").join("b.log"), 200);
    write_file(&tmp.join("c.log"), 300);
    let paths = StaticPaths::new(Platform::Linux)
        .with_var("TMPDIR", &tmp)
        .with_home(root.path().join("home"))
        .with_cache(root.path().join("cache"))
        .with_config(root.path().join("config"));
    (root, paths)
}

#[tokio::test(flavor = "multi_thread")]
async fn test_no_selection_invokes_nothing() {
    let (root, paths) = sandbox();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let opts = CleanOptions::new().with_progress(move |_, _, _| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let result = Cleaner::new().with_paths(paths).perform_clean(opts).await;

    assert!(result.is_empty());
    assert_eq!(result.duration, Duration::ZERO);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(list_files(root.path()).len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_user_temp_live_then_idempotent() {
    let (root, paths) = sandbox();
    let cleaner = Cleaner::new().with_paths(paths);
    let opts = || CleanOptions::new().with_categories([Category::UserTemp]);

    let first = cleaner.perform_clean(opts()).await;
    assert_eq!(first.files_deleted, 3);
    assert_eq!(first.space_freed, 600);
    assert!(first.errors.is_empty());
    assert!(list_files(root.path()).is_empty());

    let second = cleaner.perform_clean(opts()).await;
    assert_eq!(second.files_deleted, 0);
    assert_eq!(second.space_freed, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_reports_without_mutation() {
    let (root, paths) = sandbox();
    let before = list_files(root.path());

    let result = Cleaner::new()
        .with_paths(paths)
        .perform_clean(
            CleanOptions::new()
                .with_categories([Category::UserTemp])
                .with_dry_run(true),
        )
        .await;

    assert_eq!(result.files_deleted, 3);
    assert_eq!(result.space_freed, 600);
    assert_eq!(list_files(root.path()), before);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_progress_reported_per_category() {
    let (_root, paths) = sandbox();
    let events: Arc<Mutex<Vec<(String, u64, u64)>>> = Arc::default();
    let sink = Arc::clone(&events);
    let opts = CleanOptions::new()
        .with_categories([Category::UserTemp, Category::JavaCache, Category::DnsCache])
        .with_dry_run(true)
        .with_progress(move |label, current, total| {
            sink.lock().unwrap().push((label.to_string(), current, total));
        });

    Cleaner::new().with_paths(paths).perform_clean(opts).await;

    let events = events.lock().unwrap();
    let mut by_label: HashMap<&str, Vec<u64>> = HashMap::new();
    for (label, current, total) in events.iter() {
        assert_eq!(*total, 100);
        by_label.entry(label.as_str()).or_default().push(*current);
    }
    assert_eq!(by_label.len(), 3);
    for (label, steps) in by_label {
        assert_eq!(steps, vec![0, 100], "progress for {label}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_category_deadline_yields_timeout_for_category() {
    let (_root, paths) = sandbox();
    let cleaner = Cleaner::new()
        .with_paths(paths)
        .with_deleter(SlowDeleter(Duration::from_millis(300)))
        .with_limits(
            Limits::default()
                .with_file(Duration::from_secs(5))
                .with_dir(Duration::from_secs(10))
                .with_category(Duration::from_millis(200))
                .with_run(Duration::from_secs(30)),
        );

    let started = Instant::now();
    let result = cleaner
        .perform_clean(CleanOptions::new().with_categories([Category::UserTemp, Category::JavaCache]))
        .await;

    assert!(started.elapsed() < Duration::from_secs(3));
    let timeouts: Vec<_> = result
        .errors
        .iter()
        .filter(|e| e.kind == ErrorKind::Timeout)
        .collect();
    assert_eq!(timeouts.len(), 1);
    assert_eq!(timeouts[0].path, std::path::Path::new(Category::UserTemp.label()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_category_deadline_keeps_files_already_deleted() {
    let root = TempDir::new().unwrap();
    let first = root.path().join("temp");
    let second = root.path().join("tmp");
    for i in 0..3 {
        write_file(&first.join(format!("a{i}.tmp")), 10);
    }
    for i in 0..10 {
        write_file(&second.join(format!("b{i}.tmp")), 10);
    }
    let paths = StaticPaths::new(Platform::Linux)
        .with_var("TEMP", &first)
        .with_var("TMP", &second)
        .with_home(root.path().join("home"))
        .with_cache(root.path().join("cache"))
        .with_config(root.path().join("config"));
    let cleaner = Cleaner::new()
        .with_paths(paths)
        .with_deleter(SlowDeleter(Duration::from_millis(150)))
        .with_limits(
            Limits::default()
                .with_file(Duration::from_secs(2))
                .with_dir(Duration::from_secs(5))
                .with_category(Duration::from_secs(1))
                .with_run(Duration::from_secs(30)),
        );

    let result = cleaner
        .perform_clean(CleanOptions::new().with_categories([Category::UserTemp]))
        .await;

    let removed = 13 - list_files(root.path()).len() as u64;
    assert!(result.files_deleted > 3, "reported {}", result.files_deleted);
    assert_eq!(result.files_deleted, removed);
    assert_eq!(result.space_freed, removed * 10);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(result.errors[0].path, std::path::Path::new(Category::UserTemp.label()));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_run_deadline_returns_partial_aggregate() {
    let cleaner = Cleaner::new().with_limits(
        Limits::default()
            .with_category(Duration::from_secs(60))
            .with_run(Duration::from_millis(200)),
    );
    let done = CleanTask::new("done", |_, _| async {
        let mut r = CleanResult::new();
        r.record_deleted(1_000);
        r
    });
    let hung = CleanTask::new("hung", |_, sink: ResultSink| async move {
        let mut r = CleanResult::new();
        r.record_deleted(24);
        sink.emit(r);
        tokio::time::sleep(Duration::from_secs(120)).await;
        CleanResult::new()
    });

    let started = Instant::now();
    let result = cleaner.run_tasks(vec![done, hung], CleanOptions::new()).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.files_deleted, 2);
    assert_eq!(result.space_freed, 1_024);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Timeout);
    assert!(result.duration >= Duration::from_millis(200));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_pool_never_exceeds_max_workers() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<CleanTask> = (0..12)
        .map(|i| {
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            CleanTask::new(format!("task-{i}"), move |_, _| {
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    let mut r = CleanResult::new();
                    r.record_deleted(1);
                    r
                }
            })
        })
        .collect();

    let result = Cleaner::new()
        .with_max_workers(3)
        .run_tasks(tasks, CleanOptions::new())
        .await;

    assert_eq!(result.files_deleted, 12);
    let peak = peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak}");
    assert!(peak >= 2, "workers did not overlap");
}
