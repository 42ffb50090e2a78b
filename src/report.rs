//! Human and machine readable rendering of a [`CleanResult`].

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

use crate::cleaner::{Category, CleanResult, ErrorKind};

/// At most this many errors are listed in text output.
const MAX_LISTED_ERRORS: usize = 20;

/// Bytes as B/KB/MB/GB with a 1024 base.
pub fn format_bytes(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::WINDOWS)
}

/// Elapsed time at millisecond resolution.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1_000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{}.{:03}s", ms / 1_000, ms % 1_000)
    } else {
        let secs = ms / 1_000;
        format!("{}m {:02}.{:03}s", secs / 60, secs % 60, ms % 1_000)
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dry_run: bool,
    categories: Vec<&'static str>,
    #[serde(flatten)]
    result: &'a CleanResult,
}

/// Pretty JSON document with the selection and the full result.
pub fn render_json(result: &CleanResult, categories: &[Category], dry_run: bool) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        dry_run,
        categories: categories.iter().map(|c| c.key()).collect(),
        result,
    })
}

/// Multi-line summary for a terminal.
pub fn render_text(result: &CleanResult, dry_run: bool) -> String {
    let mut out = String::new();
    let header = if dry_run {
        "=== Dry run: nothing was deleted ==="
    } else {
        "=== Cleanup complete ==="
    };
    let _ = writeln!(out, "{}", header.bold().white());

    let (files_label, space_label) = if dry_run {
        ("Files that would be deleted:", "Space that would be freed:")
    } else {
        ("Files deleted:", "Space freed:")
    };
    let _ = writeln!(out, "  {:<30} {}", files_label, result.files_deleted.to_string().green());
    let _ = writeln!(out, "  {:<30} {}", space_label, format_bytes(result.space_freed).green().bold());

    if result.skipped_files > 0 {
        let _ = writeln!(
            out,
            "  {:<30} {} ({} in use, {} access denied)",
            "Files skipped:",
            result.skipped_files.to_string().yellow(),
            result.locked_files,
            result.permission_files
        );
    }
    let _ = writeln!(out, "  {:<30} {}", "Duration:", format_duration(result.duration));

    if !result.errors.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{} {}", "Errors:".red().bold(), result.errors.len());
        for err in result.errors.iter().take(MAX_LISTED_ERRORS) {
            let tag = match err.kind {
                ErrorKind::Timeout => "timeout".yellow(),
                _ => "error".red(),
            };
            let _ = writeln!(out, "  [{}] {}", tag, err);
        }
        if result.errors.len() > MAX_LISTED_ERRORS {
            let more = result.errors.len() - MAX_LISTED_ERRORS;
            let _ = writeln!(out, "  {}", format!("... and {more} more").dimmed());
        }
    }
    out
}

/// Table of every category for `reclaim list`.
pub fn render_categories(enabled: &[Category]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=== Categories ===".bold().white());
    for category in Category::all() {
        let marker = if enabled.contains(&category) {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let _ = writeln!(out, "  {} {:<24} {}", marker, category.key(), category.label().dimmed());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "  {}", "* enabled by default".dimmed());
    out
}
