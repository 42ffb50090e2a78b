use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use super::categories::Category;

/// Progress callback: `(category label, current, total)`.
///
/// Called at 0 and 100 of 100 for every category. It runs on the worker that
/// executes the category, so it must return promptly.
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// What to clean and how.
#[derive(Clone, Default)]
pub struct CleanOptions {
    /// Enabled categories. A category is switched on by being in the set.
    pub categories: BTreeSet<Category>,
    /// Measure only; never touch the filesystem.
    pub dry_run: bool,
    pub progress: Option<ProgressFn>,
}

impl CleanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known category enabled.
    pub fn all() -> Self {
        Self {
            categories: Category::all().collect(),
            ..Self::default()
        }
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories.extend(categories);
        self
    }

    pub fn is_enabled(&self, category: Category) -> bool {
        self.categories.contains(&category)
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, u64, u64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// True when no category is enabled.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub(crate) fn report_progress(&self, label: &str, current: u64, total: u64) {
        if let Some(ref callback) = self.progress {
            callback(label, current, total);
        }
    }
}

impl fmt::Debug for CleanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanOptions")
            .field("categories", &self.categories)
            .field("dry_run", &self.dry_run)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
