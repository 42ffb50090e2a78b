//! Where category targets live.
//!
//! Categories never read the environment directly; they ask a [`PathSource`].
//! Any lookup that cannot be answered returns `None`, which category resolvers
//! turn into "no targets" rather than an error.

use std::collections::HashMap;
use std::path::PathBuf;

/// Operating system family a path table is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
    Other,
}

impl Platform {
    /// Platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Other
        }
    }

    pub fn is_unix(self) -> bool {
        matches!(self, Platform::MacOs | Platform::Linux)
    }
}

/// Provider of the environment-derived directories categories are built on.
pub trait PathSource: Send + Sync {
    fn platform(&self) -> Platform;

    /// Environment variable as a path. Unset and empty values are `None`.
    fn var(&self, key: &str) -> Option<PathBuf>;

    fn home_dir(&self) -> Option<PathBuf>;

    /// Per-user cache root (`~/.cache`, `~/Library/Caches`, `%LOCALAPPDATA%`).
    fn cache_dir(&self) -> Option<PathBuf>;

    /// Per-user config root (`~/.config`, `~/Library/Application Support`, `%APPDATA%`).
    fn config_dir(&self) -> Option<PathBuf>;
}

/// Reads the live process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPaths;

impl PathSource for SystemPaths {
    fn platform(&self) -> Platform {
        Platform::current()
    }

    fn var(&self, key: &str) -> Option<PathBuf> {
        std::env::var_os(key)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        dirs::cache_dir()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

/// Fixed answers, for tests and for pointing a run at a sandbox tree.
#[derive(Debug, Clone)]
pub struct StaticPaths {
    platform: Platform,
    vars: HashMap<String, PathBuf>,
    home: Option<PathBuf>,
    cache: Option<PathBuf>,
    config: Option<PathBuf>,
}

impl StaticPaths {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            vars: HashMap::new(),
            home: None,
            cache: None,
            config: None,
        }
    }

    pub fn with_var(mut self, key: &str, value: impl Into<PathBuf>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn with_cache(mut self, cache: impl Into<PathBuf>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    pub fn with_config(mut self, config: impl Into<PathBuf>) -> Self {
        self.config = Some(config.into());
        self
    }
}

impl PathSource for StaticPaths {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn var(&self, key: &str) -> Option<PathBuf> {
        self.vars
            .get(key)
            .filter(|v| !v.as_os_str().is_empty())
            .cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn cache_dir(&self) -> Option<PathBuf> {
        self.cache.clone()
    }

    fn config_dir(&self) -> Option<PathBuf> {
        self.config.clone()
    }
}
