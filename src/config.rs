//! Persistent settings for the `reclaim` binary.
//!
//! Stored as TOML at `<config dir>/reclaim/config.toml`. A missing file is not
//! an error; every field falls back to its default.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cleaner::{Category, CleanOptions, Cleaner, Limits};

pub const APP_DIR: &str = "reclaim";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Bounds for the configured worker count.
pub const MIN_WORKERS: usize = 1;
pub const MAX_WORKERS: usize = 16;

const DEFAULT_CATEGORIES: &[Category] = &[
    Category::WindowsTemp,
    Category::UserTemp,
    Category::Prefetch,
    Category::ThumbnailCache,
    Category::DnsCache,
    Category::ChromeCache,
    Category::FirefoxCache,
    Category::EdgeCache,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Categories cleaned when no selection is given on the command line.
    pub categories: Vec<Category>,
    pub dry_run: bool,
    pub max_workers: usize,
    pub limits: Limits,
    pub profiles: BTreeMap<String, Profile>,
}

/// Named category selection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub categories: Vec<Category>,
    /// Overrides the top-level `dry_run` when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.to_vec(),
            dry_run: false,
            max_workers: crate::cleaner::limits::MAX_WORKERS,
            limits: Limits::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir().context("Unable to determine user config directory")?;
        Ok(base.join(APP_DIR).join(CONFIG_FILE_NAME))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.validate()?;
        Ok(config.normalized())
    }

    /// Write to `path`, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let text = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, text).with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for name in self.profiles.keys() {
            validate_profile_name(name)?;
        }
        Ok(())
    }

    /// Clamp values that are out of range.
    pub fn normalized(mut self) -> Self {
        let clamped = self.max_workers.clamp(MIN_WORKERS, MAX_WORKERS);
        if clamped != self.max_workers {
            tracing::warn!(
                configured = self.max_workers,
                used = clamped,
                "max_workers out of range, clamped"
            );
            self.max_workers = clamped;
        }
        if !self.limits.is_nested() {
            // Kept as configured; an outer deadline may then cut off inner work
            tracing::warn!(
                limits = ?self.limits,
                "limits are not nested (file <= dir <= category <= run)"
            );
        }
        self
    }

    pub fn profile(&self, name: &str) -> Result<&Profile> {
        validate_profile_name(name)?;
        self.profiles
            .get(name)
            .with_context(|| format!("Profile '{name}' not found"))
    }

    /// Options for the default selection.
    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions::new()
            .with_categories(self.categories.iter().copied())
            .with_dry_run(self.dry_run)
    }

    /// Options for a named profile.
    pub fn profile_options(&self, name: &str) -> Result<CleanOptions> {
        let profile = self.profile(name)?;
        Ok(CleanOptions::new()
            .with_categories(profile.categories.iter().copied())
            .with_dry_run(profile.dry_run.unwrap_or(self.dry_run)))
    }

    /// Engine configured with these limits and worker count.
    pub fn cleaner(&self) -> Cleaner {
        Cleaner::new()
            .with_limits(self.limits)
            .with_max_workers(self.max_workers.clamp(MIN_WORKERS, MAX_WORKERS))
    }
}

/// Profile names become table keys and may be typed on the command line.
pub fn validate_profile_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Profile name must not be empty");
    }
    if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        bail!("Invalid profile name: {name:?}");
    }
    Ok(())
}
