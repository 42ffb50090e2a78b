//! Tracing subscriber setup for the `reclaim` binary.
//!
//! Filter priority, highest first: `RECLAIM_LOG`, `RUST_LOG`, the `-v`/`-q`
//! flags, then the `warn` default. Logs always go to stderr so `--json`
//! output on stdout stays machine-readable.

use anyhow::{anyhow, Result};
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RECLAIM_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    Quiet,
    #[default]
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given.
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(verbosity: Verbosity) -> Result<()> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(verbosity == Verbosity::Verbose);

    let registry = tracing_subscriber::registry().with(build_filter(verbosity));
    let result = if verbosity == Verbosity::Verbose {
        registry.with(fmt_layer.with_timer(fmt::time::uptime())).try_init()
    } else {
        registry.with(fmt_layer.without_time().compact()).try_init()
    };
    result.map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(verbosity: Verbosity) -> EnvFilter {
    // Unparseable directives fall through to the next source
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    filter_for(verbosity)
}

fn filter_for(verbosity: Verbosity) -> EnvFilter {
    match verbosity {
        Verbosity::Verbose => EnvFilter::new("reclaim=debug,info"),
        other => EnvFilter::new(other.level().as_str().to_lowercase()),
    }
}
