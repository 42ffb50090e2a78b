// Directory sweep behavior: age filter, dry-run, idempotence, error routing

use reclaim::cleaner::{BoundedRemover, ErrorKind, FsDeleter, Sweeper};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use super::common::{age_file, list_files, write_file, FailingDeleter, SlowDeleter, DAY};

fn sweeper_with(deleter: impl reclaim::cleaner::Deleter + 'static) -> Sweeper {
    Sweeper::new(
        BoundedRemover::new(Arc::new(deleter), Duration::from_secs(2)),
        Duration::from_secs(30),
    )
}

/// Three files: 100 and 200 bytes aged 40 days, 300 bytes aged 1 day.
fn aged_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let a = write_file(&dir.path().join("a.tmp"), 100);
    let b = write_file(&dir.path().join("nested").join("b.tmp"), 200);
    let c = write_file(&dir.path().join("c.tmp"), 300);
    age_file(&a, 40 * DAY);
    age_file(&b, 40 * DAY);
    age_file(&c, DAY);
    dir
}

#[tokio::test(flavor = "multi_thread")]
async fn test_age_filter_removes_only_old_files() {
    let dir = aged_fixture();

    let result = Sweeper::default().sweep(dir.path(), 30 * DAY, false).await;

    assert_eq!(result.files_deleted, 2);
    assert_eq!(result.space_freed, 300);
    assert!(result.errors.is_empty());
    let left = list_files(dir.path());
    assert_eq!(left, vec![dir.path().join("c.tmp")]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_zero_max_age_sweeps_everything_but_keeps_dirs() {
    let dir = aged_fixture();

    let result = Sweeper::default().sweep(dir.path(), Duration::ZERO, false).await;

    assert_eq!(result.files_deleted, 3);
    assert_eq!(result.space_freed, 600);
    assert!(list_files(dir.path()).is_empty());
    assert!(dir.path().join("nested").is_dir());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dry_run_does_not_touch_files() {
    let dir = aged_fixture();
    let before = list_files(dir.path());

    let dry = Sweeper::default().sweep(dir.path(), Duration::ZERO, true).await;

    assert_eq!(dry.files_deleted, 3);
    assert_eq!(dry.space_freed, 600);
    assert_eq!(list_files(dir.path()), before);

    // Dry-run totals match what a live run then removes
    let live = Sweeper::default().sweep(dir.path(), Duration::ZERO, false).await;
    assert_eq!(live.files_deleted, dry.files_deleted);
    assert_eq!(live.space_freed, dry.space_freed);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_second_live_run_deletes_nothing() {
    let dir = aged_fixture();
    let sweeper = Sweeper::default();

    let first = sweeper.sweep(dir.path(), 30 * DAY, false).await;
    let second = sweeper.sweep(dir.path(), 30 * DAY, false).await;

    assert_eq!(first.files_deleted, 2);
    assert_eq!(second.files_deleted, 0);
    assert_eq!(second.space_freed, 0);
    assert!(second.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_directory_is_benign() {
    let dir = TempDir::new().unwrap();
    let result = Sweeper::default()
        .sweep(&dir.path().join("does-not-exist"), Duration::ZERO, false)
        .await;
    assert!(result.is_empty());
    assert_eq!(result.locked_files, 0);
    assert_eq!(result.permission_files, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_locked_files_are_counted_not_listed() {
    let dir = aged_fixture();

    let result = sweeper_with(FailingDeleter::locked())
        .sweep(dir.path(), Duration::ZERO, false)
        .await;

    assert_eq!(result.files_deleted, 0);
    assert_eq!(result.skipped_files, 3);
    assert_eq!(result.locked_files, 3);
    assert!(result.errors.is_empty());
    assert_eq!(list_files(dir.path()).len(), 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_denied_files_are_counted_not_listed() {
    let dir = aged_fixture();

    let result = sweeper_with(FailingDeleter::denied())
        .sweep(dir.path(), Duration::ZERO, false)
        .await;

    assert_eq!(result.skipped_files, 3);
    assert_eq!(result.permission_files, 3);
    assert_eq!(result.locked_files, 0);
    assert!(result.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_vanished_files_are_ignored() {
    let dir = aged_fixture();

    let result = sweeper_with(FailingDeleter::vanished())
        .sweep(dir.path(), Duration::ZERO, false)
        .await;

    assert!(result.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unexpected_failures_are_listed() {
    let dir = aged_fixture();

    let result = sweeper_with(FailingDeleter::broken())
        .sweep(dir.path(), Duration::ZERO, false)
        .await;

    assert_eq!(result.skipped_files, 0);
    assert_eq!(result.errors.len(), 3);
    assert!(result.errors.iter().all(|e| e.kind == ErrorKind::Other));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_directory_deadline_keeps_partial_and_adds_timeout() {
    let dir = TempDir::new().unwrap();
    for i in 0..10 {
        write_file(&dir.path().join(format!("f{i}.tmp")), 10);
    }
    let sweeper = Sweeper::new(
        BoundedRemover::new(Arc::new(SlowDeleter(Duration::from_millis(100))), Duration::from_secs(5)),
        Duration::from_millis(450),
    );

    let started = Instant::now();
    let result = sweeper.sweep(dir.path(), Duration::ZERO, false).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    let removed = 10 - list_files(dir.path()).len() as u64;
    assert!(result.files_deleted >= 1);
    // The walk may finish one in-flight delete after the sweep returned
    assert!(result.files_deleted <= removed);
    assert_eq!(result.space_freed, result.files_deleted * 10);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(result.errors[0].path, dir.path());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_blocked_deletes_count_as_locked_within_dir_deadline() {
    let dir = TempDir::new().unwrap();
    for i in 0..3 {
        write_file(&dir.path().join(format!("held{i}.tmp")), 10);
    }
    let dir_timeout = Duration::from_secs(5);
    let sweeper = Sweeper::new(
        BoundedRemover::new(Arc::new(SlowDeleter(Duration::from_secs(60))), Duration::from_millis(100)),
        dir_timeout,
    );

    let started = Instant::now();
    let result = sweeper.sweep(dir.path(), Duration::ZERO, false).await;

    assert!(started.elapsed() < dir_timeout + Duration::from_secs(1));
    assert_eq!(result.files_deleted, 0);
    assert_eq!(result.skipped_files, 3);
    assert_eq!(result.locked_files, 3);
    assert_eq!(result.permission_files, 0);
    assert!(result.errors.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_singleton_file_target() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir.path().join("MEMORY.DMP"), 4096);
    let sweeper = sweeper_with(FsDeleter);

    let dry = sweeper.remove_file(&file, true).await;
    assert_eq!(dry.space_freed, 4096);
    assert!(file.exists());

    let live = sweeper.remove_file(&file, false).await;
    assert_eq!(live.files_deleted, 1);
    assert!(!file.exists());

    let again = sweeper.remove_file(&file, false).await;
    assert!(again.is_empty());
}
