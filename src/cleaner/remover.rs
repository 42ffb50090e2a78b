//! Deadline-bounded single file removal.
//!
//! The delete call runs on its own thread and the caller waits on a channel
//! with a timeout. If the deadline passes first the thread is abandoned: it is
//! not interrupted and its eventual outcome is dropped. Under pathological
//! lock conditions those threads can pile up until the OS call returns.

use crossbeam_channel::{bounded, RecvTimeoutError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::error::{classify, CleanError};

/// Default per-file deadline.
pub const FILE_TIMEOUT: Duration = Duration::from_secs(2);

/// The primitive that actually unlinks a file.
pub trait Deleter: Send + Sync {
    fn delete(&self, path: &Path) -> io::Result<()>;
}

/// Deletes through `std::fs::remove_file`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDeleter;

impl Deleter for FsDeleter {
    fn delete(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

/// Removes one file at a time, never waiting longer than its timeout.
#[derive(Clone)]
pub struct BoundedRemover {
    deleter: Arc<dyn Deleter>,
    timeout: Duration,
}

impl BoundedRemover {
    pub fn new(deleter: Arc<dyn Deleter>, timeout: Duration) -> Self {
        Self { deleter, timeout }
    }

    /// Delete `path`, returning a classified error on failure or expiry.
    pub fn remove(&self, path: &Path) -> Result<(), CleanError> {
        let (tx, rx) = bounded::<io::Result<()>>(1);
        let deleter = Arc::clone(&self.deleter);
        let target: PathBuf = path.to_path_buf();

        let spawned = thread::Builder::new()
            .name("reclaim-unlink".to_string())
            .spawn(move || {
                let outcome = deleter.delete(&target);
                // Receiver is gone when the caller already gave up
                let _ = tx.send(outcome);
            });
        if let Err(e) = spawned {
            return Err(classify(path, e));
        }

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(classify(path, e)),
            Err(RecvTimeoutError::Timeout) => {
                tracing::debug!(path = %path.display(), "delete abandoned after {:?}", self.timeout);
                Err(CleanError::timed_out(path, "removing"))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(CleanError::other(path, "delete thread exited without reporting"))
            }
        }
    }
}

impl Default for BoundedRemover {
    fn default() -> Self {
        Self::new(Arc::new(FsDeleter), FILE_TIMEOUT)
    }
}
