//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! 3 HEIF files in photos/
//! 001 IMG_0001.HEIC
//!     Source: photos/IMG_0001.HEIC
//!     Output: photos/IMG_0001.jpg
//! ```
//!
//! ## Convert
//!
//! Progress lines are the same strings the desktop results list shows, so
//! both front ends report identically:
//!
//! ```text
//! Converting 2 files
//! ✓ Converted: a.jpg
//! ✗ Failed: b.heif (decode failed: b.heif: ...)
//! Converted 1 of 2 (1 failed)
//! ```
//!
//! ## Preview
//!
//! ```text
//! a.heif: 320x240 preview
//!     Saved: a-preview.png
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::convert::{BatchReport, ConvertEvent};
use crate::imaging::PreviewImage;
use crate::naming::output_path;
use crate::results;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:03}", pos)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

// ============================================================================
// Scan
// ============================================================================

/// Format the files a folder selection would convert, with their outputs.
pub fn format_scan_output(dir: &Path, files: &[PathBuf], alternate: Option<&Path>) -> Vec<String> {
    let mut lines = vec![format!(
        "{} in {}",
        plural(files.len(), "HEIF file"),
        dir.display()
    )];
    for (i, file) in files.iter().enumerate() {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string());
        lines.push(format!("{} {}", format_index(i + 1), name));
        lines.push(format!("    Source: {}", file.display()));
        lines.push(format!(
            "    Output: {}",
            output_path(file, alternate).display()
        ));
    }
    lines
}

pub fn print_scan_output(dir: &Path, files: &[PathBuf], alternate: Option<&Path>) {
    for line in format_scan_output(dir, files, alternate) {
        println!("{}", line);
    }
}

// ============================================================================
// Convert
// ============================================================================

/// Format a single conversion progress event as display lines.
pub fn format_convert_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::Started { total } => vec![format!("Converting {}", plural(*total, "file"))],
        ConvertEvent::TaskFinished { task, .. } => results::task_line(task).into_iter().collect(),
        ConvertEvent::Cancelled { remaining } => vec![results::cancelled_line(*remaining)],
        // The summary comes from the report once the batch is joined
        ConvertEvent::Finished { .. } => Vec::new(),
    }
}

/// Format the closing summary of a batch.
pub fn format_report(report: &BatchReport) -> Vec<String> {
    let attempted = report.outcomes.len();
    let total = attempted + report.skipped;
    let mut summary = format!("Converted {} of {}", report.succeeded(), total);
    if report.failed() > 0 {
        summary.push_str(&format!(" ({} failed)", report.failed()));
    }
    if report.cancelled {
        summary.push_str(", cancelled");
    }
    vec![summary]
}

pub fn print_report(report: &BatchReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Preview
// ============================================================================

pub fn format_preview_output(preview: &PreviewImage, saved: Option<&Path>) -> Vec<String> {
    let name = preview
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| preview.source.display().to_string());
    let mut lines = vec![format!(
        "{}: {}x{} preview",
        name, preview.width, preview.height
    )];
    if let Some(path) = saved {
        lines.push(format!("    Saved: {}", path.display()));
    }
    lines
}

pub fn print_preview_output(preview: &PreviewImage, saved: Option<&Path>) {
    for line in format_preview_output(preview, saved) {
        println!("{}", line);
    }
}
