//! CLI presentation: text and json formatters for command outcomes.

use crate::error::{ApiError, FileFailure, StorageError};
use crate::reconcile::DiffReport;
use crate::workspace::CommandOutcome;
use owo_colors::OwoColorize;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Rendering switches resolved from config and CLI flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportStyle {
    pub color: bool,
    pub verbose_failures: bool,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            color: true,
            verbose_failures: false,
        }
    }
}

#[derive(Clone, Copy)]
enum Heading {
    Added,
    Removed,
    Modified,
    Corruption,
    Refreshed,
    Failures,
}

impl Heading {
    fn paint(self, text: &str, color: bool) -> String {
        if !color {
            return text.to_string();
        }
        match self {
            Heading::Added => text.green().bold().to_string(),
            Heading::Removed => text.blue().bold().to_string(),
            Heading::Modified => text.red().bold().to_string(),
            Heading::Corruption => text.magenta().bold().to_string(),
            Heading::Refreshed => text.cyan().bold().to_string(),
            Heading::Failures => text.yellow().bold().to_string(),
        }
    }
}

/// Text report: one section per non-empty class, failures, then the message.
///
/// An exported listing is returned verbatim so stdout stays machine-readable.
pub fn format_outcome_text(outcome: &CommandOutcome, style: &ReportStyle) -> String {
    if let Some(listing) = &outcome.listing {
        return listing.clone();
    }

    let mut out = String::new();
    if let Some(report) = &outcome.report {
        write_report(&mut out, report, style.color);
    }
    write_failures(&mut out, &outcome.failures, style);
    out.push_str(&outcome.message);
    out.trim_end().to_string()
}

fn write_report(out: &mut String, report: &DiffReport, color: bool) {
    write_section(out, Heading::Added, "Added files:", &report.added, color);
    write_section(out, Heading::Removed, "Removed files:", &report.removed, color);
    write_section(out, Heading::Modified, "Modified files:", &report.modified, color);
    write_section(
        out,
        Heading::Corruption,
        "Possible corruption (content changed, size and mtime did not):",
        &report.corruption,
        color,
    );
    write_section(
        out,
        Heading::Refreshed,
        "Metadata refreshed (content unchanged):",
        &report.mtime_refreshed,
        color,
    );
}

fn write_section<T: std::fmt::Display>(
    out: &mut String,
    heading: Heading,
    title: &str,
    paths: &BTreeSet<T>,
    color: bool,
) {
    if paths.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", heading.paint(title, color));
    for path in paths {
        let _ = writeln!(out, "{}", path);
    }
    out.push('\n');
}

fn write_failures(out: &mut String, failures: &[FileFailure], style: &ReportStyle) {
    if failures.is_empty() {
        return;
    }
    let title = format!("Failures ({}):", failures.len());
    let _ = writeln!(out, "{}", Heading::Failures.paint(&title, style.color));
    for failure in failures {
        if style.verbose_failures {
            let _ = writeln!(out, "{}: {}", failure.path, failure.kind);
        } else {
            let _ = writeln!(out, "{}", failure.path);
        }
    }
    out.push('\n');
}

/// JSON report for scripting.
pub fn format_outcome_json(outcome: &CommandOutcome) -> Result<String, ApiError> {
    let value = serde_json::json!({
        "command": outcome.command.name(),
        "success": outcome.is_success(),
        "report": outcome.report,
        "failures": outcome.failures,
        "message": outcome.message,
        "listing": outcome.listing,
    });
    serde_json::to_string_pretty(&value)
        .map_err(|e| ApiError::StorageError(StorageError::InvalidPath(e.to_string())))
}
