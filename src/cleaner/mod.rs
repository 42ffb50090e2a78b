//! Cleaner module - bounded, concurrent removal of temporary and cache files
//!
//! A run selects categories, resolves each to concrete targets, sweeps them on
//! a small worker pool and merges everything into one [`CleanResult`]. Every
//! level (file, directory, category, run) has its own deadline.

pub mod categories;
pub mod error;
pub mod limits;
pub mod options;
pub mod orchestrator;
pub mod paths;
pub mod pool;
pub mod remover;
pub mod result;
pub mod sweeper;
pub mod task;

pub use categories::{Category, Target};
pub use error::{classify, CleanError, ErrorKind};
pub use limits::Limits;
pub use options::{CleanOptions, ProgressFn};
pub use orchestrator::{perform_clean, Cleaner};
pub use paths::{PathSource, Platform, StaticPaths, SystemPaths};
pub use pool::WorkerPool;
pub use remover::{BoundedRemover, Deleter, FsDeleter};
pub use result::{CleanResult, ResultSink};
pub use sweeper::Sweeper;
pub use task::CleanTask;
