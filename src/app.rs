//! Application state for the interactive front end.
//!
//! Everything a window shows lives in [`AppState`] and changes only through
//! its methods, so the desktop UI is a thin projection that renders the
//! state and forwards clicks. The same state drives tests without a window.
//!
//! A batch runs on a worker thread (see [`convert::spawn_batch`]); the owner
//! of the state calls [`AppState::poll_events`] periodically to move results
//! from the worker's channel into the results list.

use crate::config::AppConfig;
use crate::convert::{self, BatchHandle, BatchReport, ConvertError, ConvertEvent, ConvertOptions};
use crate::imaging::{ImageBackend, PreviewBounds, PreviewImage};
use crate::path_memory::{PathMemory, PathMemoryError};
use crate::preview;
use crate::results::ResultsLog;
use crate::selection::{ScanOptions, Selection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::TryRecvError;

/// A message that needs the user's acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Error { title: String, message: String },
}

impl Notification {
    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Notification::Error {
            title: title.into(),
            message: message.into(),
        }
    }
}

/// What the window shows, plus the running batch if any.
pub struct AppState {
    backend: Arc<dyn ImageBackend>,
    preview_bounds: PreviewBounds,
    scan_options: ScanOptions,
    memory: Option<PathMemory>,

    selection: Selection,
    selected: Option<usize>,
    preview: Option<PreviewImage>,
    alternate_enabled: bool,
    alternate_dir: String,
    results: ResultsLog,
    notification: Option<Notification>,
    batch: Option<BatchHandle>,
    last_report: Option<BatchReport>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        preview_bounds: PreviewBounds,
        scan_options: ScanOptions,
        memory: Option<PathMemory>,
    ) -> Self {
        Self {
            backend,
            preview_bounds,
            scan_options,
            memory,
            selection: Selection::new(),
            selected: None,
            preview: None,
            alternate_enabled: false,
            alternate_dir: String::new(),
            results: ResultsLog::new(),
            notification: None,
            batch: None,
            last_report: None,
        }
    }

    /// State configured from `bee-convert.toml`.
    ///
    /// A path memory that cannot be located is logged and left out; the
    /// alternate directory then simply is not remembered.
    pub fn from_config(backend: Arc<dyn ImageBackend>, config: &AppConfig) -> Self {
        let memory = match config.path_memory() {
            Ok(memory) => Some(memory),
            Err(e) => {
                tracing::warn!("path memory unavailable: {e}");
                None
            }
        };
        Self::new(
            backend,
            config.preview_bounds(),
            config.scan_options(),
            memory,
        )
    }

    // =========================================================================
    // Read access for rendering
    // =========================================================================

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    pub fn alternate_enabled(&self) -> bool {
        self.alternate_enabled
    }

    pub fn alternate_dir(&self) -> &str {
        &self.alternate_dir
    }

    pub fn results(&self) -> &ResultsLog {
        &self.results
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn is_converting(&self) -> bool {
        self.batch.is_some()
    }

    pub fn last_report(&self) -> Option<&BatchReport> {
        self.last_report.as_ref()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Replace the selection with the picked files. An empty pick (dialog
    /// cancelled) leaves everything unchanged.
    pub fn choose_files(&mut self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        self.selection = Selection::from_files(paths);
        self.selected = None;
    }

    /// Replace the selection with the HEIF files in `dir`.
    ///
    /// A folder that cannot be scanned leaves the selection unchanged and
    /// raises an error notification.
    pub fn choose_folder(&mut self, dir: &Path) {
        match Selection::from_folder(dir, &self.scan_options) {
            Ok(selection) => {
                self.selection = selection;
                self.selected = None;
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), "folder selection failed: {e}");
                self.notification = Some(Notification::error(
                    "Error",
                    format!("Failed to read folder:\n{e}"),
                ));
            }
        }
    }

    /// Highlight a selection entry and load its preview.
    ///
    /// On failure the previous preview stays up and an error notification is
    /// raised with the backend's message.
    pub fn select(&mut self, index: usize) {
        let Some(task) = self.selection.get(index) else {
            return;
        };
        self.selected = Some(index);
        match preview::load_preview(self.backend.as_ref(), &task.source, self.preview_bounds) {
            Ok(image) => self.preview = Some(image),
            Err(e) => {
                tracing::warn!(path = %task.source.display(), "preview failed: {e}");
                self.notification = Some(Notification::error(
                    "Error",
                    format!("Failed to load image:\n{e}"),
                ));
            }
        }
    }

    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    // =========================================================================
    // Alternate output directory
    // =========================================================================

    /// Toggle the alternate output directory.
    ///
    /// Enabling fills the field from path memory, or empties it when nothing
    /// is remembered. Disabling leaves the field and all files alone.
    pub fn set_alternate_enabled(&mut self, enabled: bool) -> Result<(), PathMemoryError> {
        self.alternate_enabled = enabled;
        if !enabled {
            return Ok(());
        }
        let remembered = match &self.memory {
            Some(memory) => memory.load()?,
            None => None,
        };
        self.alternate_dir = remembered
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(())
    }

    pub fn set_alternate_dir(&mut self, dir: impl Into<String>) {
        self.alternate_dir = dir.into();
    }

    /// Alternate directory the next batch would use, if any.
    pub fn effective_alternate_dir(&self) -> Option<PathBuf> {
        (self.alternate_enabled && !self.alternate_dir.is_empty())
            .then(|| PathBuf::from(&self.alternate_dir))
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    /// Clear the results and convert the whole selection in the background.
    ///
    /// Does nothing while a batch is already running.
    pub fn start_batch(&mut self) -> Result<(), ConvertError> {
        if self.batch.is_some() {
            return Ok(());
        }
        self.results.clear();
        self.last_report = None;

        let options = ConvertOptions {
            alternate_dir: self.effective_alternate_dir(),
            path_memory: self.memory.clone(),
        };
        let tasks = self.selection.tasks().to_vec();
        self.batch = Some(convert::spawn_batch(
            Arc::clone(&self.backend),
            tasks,
            options,
        )?);
        Ok(())
    }

    pub fn cancel_batch(&self) {
        if let Some(batch) = &self.batch {
            batch.cancel();
        }
    }

    /// Move pending progress into the results list. Returns true if anything
    /// changed, so a UI knows to redraw.
    pub fn poll_events(&mut self) -> bool {
        let Some(batch) = &self.batch else {
            return false;
        };

        let mut changed = false;
        let mut finished = false;
        loop {
            match batch.events().try_recv() {
                Ok(event) => {
                    changed = true;
                    match event {
                        ConvertEvent::Started { .. } => {}
                        ConvertEvent::TaskFinished { task, .. } => self.results.record(&task),
                        ConvertEvent::Cancelled { remaining } => {
                            self.results.record_cancelled(remaining)
                        }
                        ConvertEvent::Finished { .. } => finished = true,
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    finished = true;
                    break;
                }
            }
        }

        if finished && let Some(batch) = self.batch.take() {
            changed = true;
            match batch.join() {
                Ok(report) => self.last_report = Some(report),
                Err(e) => {
                    self.notification = Some(Notification::error("Error", e.to_string()));
                }
            }
        }
        changed
    }

    /// Block until the running batch is done, draining its events.
    pub fn wait_for_batch(&mut self) {
        while self.batch.is_some() {
            if !self.poll_events() {
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
    }

    /// Empty the selection and results and drop the preview.
    ///
    /// A running batch is cancelled and detached: the task in flight still
    /// finishes on the worker, but none of its events reach the results.
    pub fn clear(&mut self) {
        if let Some(batch) = self.batch.take() {
            batch.cancel();
        }
        self.last_report = None;
        self.selection.clear();
        self.selected = None;
        self.preview = None;
        self.results.clear();
    }
}
