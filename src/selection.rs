//! File selection: the ordered list of conversion tasks.
//!
//! A selection is built either from files picked explicitly or from a
//! folder scan, and always *replaces* the previous one. Picked files are
//! taken as-is, in pick order, duplicates included. A folder scan keeps
//! regular files whose extension is one of [`HEIF_EXTENSIONS`]
//! (case-insensitive), sorted by path so repeated scans are stable.
//!
//! The file picker filter and the folder scan share [`HEIF_EXTENSIONS`], so
//! a `.heic` file that can be picked is also found by a scan.

use crate::naming;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions offered by the file picker and matched by folder scans.
pub const HEIF_EXTENSIONS: &[&str] = &["heif", "heic"];

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("Cannot scan {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Outcome of one conversion task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Succeeded { output: PathBuf },
    Failed { reason: String },
}

/// One source image and its eventual outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub status: TaskStatus,
}

impl ConversionTask {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            status: TaskStatus::Pending,
        }
    }

    /// Where the JPEG for this task is written.
    pub fn output_path(&self, alternate: Option<&Path>) -> PathBuf {
        naming::output_path(&self.source, alternate)
    }
}

/// Folder scan settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
}

/// Returns true if the path has a HEIF/HEIC extension (any case).
pub fn has_heif_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            HEIF_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

/// The ordered list of tasks the next batch will process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    tasks: Vec<ConversionTask>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection made of exactly the given files, in the given order.
    pub fn from_files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            tasks: paths.into_iter().map(ConversionTask::new).collect(),
        }
    }

    /// Selection of every HEIF/HEIC file in `dir`.
    pub fn from_folder(dir: &Path, options: &ScanOptions) -> Result<Self, SelectionError> {
        Ok(Self::from_files(scan_folder(dir, options)?))
    }

    pub fn tasks(&self) -> &[ConversionTask] {
        &self.tasks
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.tasks.iter().map(|t| t.source.as_path())
    }

    pub fn get(&self, index: usize) -> Option<&ConversionTask> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

/// List the HEIF/HEIC files in `dir`, sorted by path.
pub fn scan_folder(dir: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>, SelectionError> {
    if !dir.is_dir() {
        return Err(SelectionError::NotADirectory(dir.to_path_buf()));
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(max_depth) {
        let entry = entry.map_err(|source| SelectionError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && has_heif_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    tracing::debug!(dir = %dir.display(), found = files.len(), "scanned folder");
    Ok(files)
}
