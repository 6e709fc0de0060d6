//! CLI output formatting for both commands.
//!
//! # Output Format
//!
//! ## assign-categories
//!
//! ```text
//! Processed 3 files with action 'copy'
//!     Placed: 2
//!     Missing: 1
//!         b.jpg → trip/
//! ```
//!
//! ## generate-thumbnails
//!
//! ```text
//! Fu Mountain (2 photos)
//!     001 Photo 20250101 1
//!         Source: photo_20250101_1.jpg
//!         Date: 2025-01-01
//!     002 Photo 20250102 2
//!         Source: photo_20250102_2.jpg
//!         Date: 2025-01-02
//! Skipped 1 file
//!     broken.jpg: Failed to decode broken.jpg
//! Wrote album 'fu-mountain' to data/photos/by-album.json
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Per-file progress goes
//! through the logger instead.

use crate::assign::AssignReport;
use crate::builder::BuildReport;
use crate::mapping::Assignment;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn assignment_line(assignment: &Assignment) -> String {
    format!(
        "{}{} → {}/",
        indent(2),
        assignment.filename,
        assignment.category
    )
}

// ============================================================================
// assign-categories
// ============================================================================

pub fn format_assign_summary(report: &AssignReport) -> Vec<String> {
    let total = report.placed.len() + report.missing.len() + report.failed.len();
    let mut lines = vec![format!(
        "Processed {} with action '{}'",
        plural(total, "file"),
        report.action
    )];

    lines.push(format!("{}Placed: {}", indent(1), report.placed.len()));

    if !report.missing.is_empty() {
        lines.push(format!("{}Missing: {}", indent(1), report.missing.len()));
        lines.extend(report.missing.iter().map(assignment_line));
    }

    if !report.failed.is_empty() {
        lines.push(format!("{}Failed: {}", indent(1), report.failed.len()));
        for failure in &report.failed {
            lines.push(format!(
                "{}: {}",
                assignment_line(&failure.assignment),
                failure.reason
            ));
        }
    }

    lines
}

pub fn print_assign_summary(report: &AssignReport) {
    for line in format_assign_summary(report) {
        println!("{}", line);
    }
}

/// Shown instead of a summary when the mapping has no entries.
pub fn format_empty_mapping() -> Vec<String> {
    vec!["Nothing to do: the mapping is empty".to_string()]
}

// ============================================================================
// generate-thumbnails
// ============================================================================

pub fn format_build_summary(report: &BuildReport) -> Vec<String> {
    let entry = &report.entry;
    let mut lines = vec![format!(
        "{} ({})",
        entry.title,
        plural(entry.photos.len(), "photo")
    )];

    for (i, photo) in entry.photos.iter().enumerate() {
        lines.push(format!(
            "{}{} {}",
            indent(1),
            format_index(i + 1),
            photo.title
        ));
        lines.push(format!("{}Source: {}", indent(2), photo.filename));
        if let Some(date) = photo.date {
            lines.push(format!("{}Date: {}", indent(2), date));
        }
    }

    if !report.skipped.is_empty() {
        lines.push(format!("Skipped {}", plural(report.skipped.len(), "file")));
        for skipped in &report.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                skipped.filename,
                skipped.reason
            ));
        }
    }

    lines.push(format!(
        "Wrote {} '{}' to {}",
        report.kind.label(),
        entry.id,
        report.index_path.display()
    ));
    if report.recovered {
        lines.push(format!(
            "{}Previous index was unreadable and has been replaced",
            indent(1)
        ));
    }

    lines
}

pub fn print_build_summary(report: &BuildReport) {
    for line in format_build_summary(report) {
        println!("{}", line);
    }
}
