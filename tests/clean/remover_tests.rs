// Bounded removal: deadline containment and error classification

use reclaim::cleaner::{BoundedRemover, ErrorKind, FsDeleter};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

use super::common::{write_file, FailingDeleter, SlowDeleter};

#[test]
fn test_blocking_delete_times_out_within_deadline() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir.path().join("held.tmp"), 16);
    let remover = BoundedRemover::new(Arc::new(SlowDeleter(Duration::from_secs(10))), Duration::from_millis(100));

    let started = Instant::now();
    let err = remover.remove(&file).unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(err.kind, ErrorKind::Timeout);
    assert_eq!(err.path, file);
    assert!(err.to_string().contains("timeout"));
}

#[test]
fn test_fast_delete_succeeds() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir.path().join("gone.tmp"), 16);

    BoundedRemover::new(Arc::new(FsDeleter), Duration::from_secs(2))
        .remove(&file)
        .unwrap();

    assert!(!file.exists());
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let err = BoundedRemover::default()
        .remove(&dir.path().join("never-existed"))
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[test]
fn test_deleter_errors_are_classified() {
    let dir = TempDir::new().unwrap();
    let file = write_file(&dir.path().join("x.tmp"), 1);
    let cases = [
        (FailingDeleter::locked(), ErrorKind::Locked),
        (FailingDeleter::denied(), ErrorKind::PermissionDenied),
        (FailingDeleter::vanished(), ErrorKind::NotFound),
        (FailingDeleter::broken(), ErrorKind::Other),
    ];

    for (deleter, expected) in cases {
        let err = BoundedRemover::new(Arc::new(deleter), Duration::from_secs(2))
            .remove(&file)
            .unwrap_err();
        assert_eq!(err.kind, expected);
    }
}
