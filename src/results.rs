//! The results list shown after a batch.
//!
//! One line per processed file, in processing order:
//!
//! ```text
//! ✓ Converted: a.jpg
//! ✗ Failed: b.heif (b.heif: failed to fill whole buffer)
//! Cancelled: 3 file(s) not converted
//! ```
//!
//! Successes name the *output* file, failures name the *source* file and
//! carry the backend's message verbatim.

use crate::naming::display_name;
use crate::selection::{ConversionTask, TaskStatus};
use serde::Serialize;

pub fn converted_line(task_output: &std::path::Path) -> String {
    format!("\u{2713} Converted: {}", display_name(task_output))
}

pub fn failed_line(source: &std::path::Path, reason: &str) -> String {
    format!("\u{2717} Failed: {} ({})", display_name(source), reason)
}

pub fn cancelled_line(remaining: usize) -> String {
    format!("Cancelled: {remaining} file(s) not converted")
}

/// Result line for a finished task; `None` while it is still pending.
pub fn task_line(task: &ConversionTask) -> Option<String> {
    match &task.status {
        TaskStatus::Pending => None,
        TaskStatus::Succeeded { output } => Some(converted_line(output)),
        TaskStatus::Failed { reason } => Some(failed_line(&task.source, reason)),
    }
}

/// Ordered, append-only list of result lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResultsLog {
    entries: Vec<String>,
}

impl ResultsLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the line for a finished task. Pending tasks add nothing.
    pub fn record(&mut self, task: &ConversionTask) {
        if let Some(line) = task_line(task) {
            self.entries.push(line);
        }
    }

    pub fn record_cancelled(&mut self, remaining: usize) {
        self.entries.push(cancelled_line(remaining));
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
