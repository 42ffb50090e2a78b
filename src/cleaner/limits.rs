// Deadline hierarchy for a cleanup run
// file < dir < category < run; each level bounds a stuck operation at its scope

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::time::Duration;

use super::remover::FILE_TIMEOUT;
use super::sweeper::DIR_TIMEOUT;

/// Default per-category deadline.
pub const CATEGORY_TIMEOUT: Duration = Duration::from_secs(120);

/// Default deadline for a whole run.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Number of concurrent category workers. Kept small so mechanical drives are
/// not saturated with seeks.
pub const MAX_WORKERS: usize = 4;

/// Timeouts applied at each level of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    #[serde(rename = "file_ms", with = "millis")]
    pub file: Duration,
    #[serde(rename = "dir_ms", with = "millis")]
    pub dir: Duration,
    #[serde(rename = "category_ms", with = "millis")]
    pub category: Duration,
    #[serde(rename = "run_ms", with = "millis")]
    pub run: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            file: FILE_TIMEOUT,
            dir: DIR_TIMEOUT,
            category: CATEGORY_TIMEOUT,
            run: RUN_TIMEOUT,
        }
    }
}

impl Limits {
    pub fn with_file(mut self, file: Duration) -> Self {
        self.file = file;
        self
    }

    pub fn with_dir(mut self, dir: Duration) -> Self {
        self.dir = dir;
        self
    }

    pub fn with_category(mut self, category: Duration) -> Self {
        self.category = category;
        self
    }

    pub fn with_run(mut self, run: Duration) -> Self {
        self.run = run;
        self
    }

    /// True when each level is no longer than the one enclosing it.
    pub fn is_nested(&self) -> bool {
        self.file <= self.dir && self.dir <= self.category && self.category <= self.run
    }
}

mod millis {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
