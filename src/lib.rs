// Library module for reclaim
// Re-exports modules for use in integration tests and the binary

pub mod cleaner;
pub mod config;
pub mod logging;
pub mod report;
