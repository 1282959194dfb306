//! Batch conversion of HEIF/HEIC files to JPEG.
//!
//! Every task goes through the same steps, in selection order:
//!
//! ```text
//! decode ─→ keep non-empty profiles ─→ retarget to JPEG ─→ reattach ─→ write
//! ```
//!
//! Retargeting detaches profiles (see
//! [`DecodedImage::set_format`](crate::imaging::DecodedImage::set_format)),
//! which is why they are collected first and reattached afterwards. Profiles
//! with no bytes are dropped rather than written as empty segments.
//!
//! ## Failure model
//!
//! A failing file never stops the batch. Its task is marked
//! [`TaskStatus::Failed`] with the backend's message and the loop moves on.
//! Nothing is rolled back and partially written outputs are left in place.
//!
//! Before the loop, a non-empty alternate directory is created if missing and
//! saved to path memory once. Neither step aborts the batch: a memory write
//! failure is only logged, and a directory that cannot be created becomes the
//! failure reason of every task.
//!
//! ## Threading
//!
//! [`convert_batch`] runs on the caller's thread. [`spawn_batch`] moves it to
//! a worker thread and hands back a [`BatchHandle`] for progress events and
//! cancellation. Cancellation is checked between tasks only, so a file is
//! never abandoned half-written.

use crate::imaging::{BackendError, ImageBackend, ImageFormat};
use crate::naming;
use crate::path_memory::PathMemory;
use crate::selection::{ConversionTask, TaskStatus};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("conversion worker panicked")]
    WorkerPanicked,
}

/// Shared flag asking a running batch to stop before its next task.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress reported while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConvertEvent {
    Started { total: usize },
    /// Sent right after each task, so results can be shown incrementally.
    TaskFinished { index: usize, task: ConversionTask },
    /// The batch stopped early; `remaining` tasks were not attempted.
    Cancelled { remaining: usize },
    Finished { succeeded: usize, failed: usize },
}

/// Batch-wide settings.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Write outputs here instead of beside their sources. Empty counts as unset.
    pub alternate_dir: Option<PathBuf>,
    /// Where to remember `alternate_dir` for the next session.
    pub path_memory: Option<PathMemory>,
}

impl ConvertOptions {
    fn effective_alternate_dir(&self) -> Option<&Path> {
        naming::effective_alternate_dir(self.alternate_dir.as_deref())
    }
}

/// Outcome of a whole batch. `outcomes` holds only the tasks that were
/// attempted, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<ConversionTask>,
    pub cancelled: bool,
    /// Tasks never attempted because of cancellation.
    pub skipped: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Succeeded { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|t| matches!(t.status, TaskStatus::Failed { .. }))
            .count()
    }
}

fn send(events: Option<&Sender<ConvertEvent>>, event: ConvertEvent) {
    // A closed receiver only means nobody is watching any more
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

/// Decode one file, carry its profiles over, and write it as JPEG.
fn convert_one(backend: &dyn ImageBackend, source: &Path, output: &Path) -> Result<(), BackendError> {
    let mut image = backend.decode(source)?;

    let retained = image.profiles().non_empty();
    for profile in &retained {
        tracing::debug!(
            source = %source.display(),
            profile = %profile.name,
            bytes = profile.len(),
            "carrying profile"
        );
    }

    image.set_format(ImageFormat::Jpeg);
    for profile in retained {
        image.set_profile(profile);
    }

    backend.write(&image, output)
}

/// Prepare the alternate directory: create it and remember it.
///
/// Returns the reason every task must fail with, if the directory is unusable.
fn prepare_alternate_dir(dir: &Path, memory: Option<&PathMemory>) -> Option<String> {
    if let Some(memory) = memory
        && let Err(e) = memory.save(dir)
    {
        tracing::warn!("could not remember output directory: {e}");
    }

    match std::fs::create_dir_all(dir) {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), "cannot create output directory: {e}");
            Some(format!("cannot create output directory {}: {}", dir.display(), e))
        }
    }
}

/// Convert `tasks` in order on the calling thread.
///
/// Tasks are consumed; their final state comes back in the report. Pass a
/// sender to receive a [`ConvertEvent`] per task.
pub fn convert_batch(
    backend: &dyn ImageBackend,
    tasks: Vec<ConversionTask>,
    options: &ConvertOptions,
    cancel: &CancelToken,
    events: Option<&Sender<ConvertEvent>>,
) -> BatchReport {
    let total = tasks.len();
    let alternate = options.effective_alternate_dir();
    tracing::info!(
        total,
        alternate_dir = ?alternate,
        "starting conversion batch"
    );
    send(events, ConvertEvent::Started { total });

    let dir_failure = match alternate {
        Some(dir) if total > 0 => prepare_alternate_dir(dir, options.path_memory.as_ref()),
        _ => None,
    };

    let mut report = BatchReport::default();
    for (index, mut task) in tasks.into_iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            report.skipped = total - index;
            tracing::info!(remaining = report.skipped, "conversion cancelled");
            send(
                events,
                ConvertEvent::Cancelled {
                    remaining: report.skipped,
                },
            );
            break;
        }

        let output = task.output_path(alternate);
        let result = match &dir_failure {
            Some(reason) => Err(reason.clone()),
            None => convert_one(backend, &task.source, &output).map_err(|e| e.to_string()),
        };

        task.status = match result {
            Ok(()) => {
                tracing::debug!(source = %task.source.display(), output = %output.display(), "converted");
                TaskStatus::Succeeded { output }
            }
            Err(reason) => {
                tracing::warn!(source = %task.source.display(), "conversion failed: {reason}");
                TaskStatus::Failed { reason }
            }
        };

        send(
            events,
            ConvertEvent::TaskFinished {
                index,
                task: task.clone(),
            },
        );
        report.outcomes.push(task);
    }

    let (succeeded, failed) = (report.succeeded(), report.failed());
    tracing::info!(succeeded, failed, "conversion batch finished");
    send(events, ConvertEvent::Finished { succeeded, failed });
    report
}

/// A batch running on a worker thread.
pub struct BatchHandle {
    cancel: CancelToken,
    events: Receiver<ConvertEvent>,
    worker: JoinHandle<BatchReport>,
}

impl BatchHandle {
    /// Ask the worker to stop before its next task.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn events(&self) -> &Receiver<ConvertEvent> {
        &self.events
    }

    /// Wait for the worker and return its report.
    pub fn join(self) -> Result<BatchReport, ConvertError> {
        self.worker.join().map_err(|_| ConvertError::WorkerPanicked)
    }
}

/// Run [`convert_batch`] on a new thread.
pub fn spawn_batch(
    backend: Arc<dyn ImageBackend>,
    tasks: Vec<ConversionTask>,
    options: ConvertOptions,
) -> Result<BatchHandle, ConvertError> {
    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();
    let worker_cancel = cancel.clone();
    let worker = std::thread::Builder::new()
        .name("bee-convert-batch".into())
        .spawn(move || convert_batch(&*backend, tasks, &options, &worker_cancel, Some(&tx)))?;

    Ok(BatchHandle {
        cancel,
        events: rx,
        worker,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{DecodedImage, Profile, ProfileName};
    use crate::path_memory::MEMORY_FILE_NAME;
    use tempfile::TempDir;

    fn tasks(paths: &[&str]) -> Vec<ConversionTask> {
        paths.iter().map(|p| ConversionTask::new(*p)).collect()
    }

    fn run(backend: &dyn ImageBackend, paths: &[&str], options: &ConvertOptions) -> BatchReport {
        convert_batch(backend, tasks(paths), options, &CancelToken::new(), None)
    }

    fn icc() -> Profile {
        Profile::new(ProfileName::Icc, vec![7u8; 64])
    }

    // =========================================================================
    // Per-file pipeline
    // =========================================================================

    #[test]
    fn good_and_corrupt_file_beside_sources() {
        let backend = MockBackend::new()
            .with_image("/photos/a.heif", vec![icc()])
            .with_decode_error("/photos/b.heif", "corrupt header");

        let report = run(
            &backend,
            &["/photos/a.heif", "/photos/b.heif"],
            &ConvertOptions::default(),
        );

        assert_eq!(
            report.outcomes[0].status,
            TaskStatus::Succeeded {
                output: PathBuf::from("/photos/a.jpg")
            }
        );
        assert!(matches!(
            &report.outcomes[1].status,
            TaskStatus::Failed { reason } if reason.contains("corrupt header")
        ));

        assert_eq!(
            backend.writes(),
            vec![RecordedOp::Write {
                output: "/photos/a.jpg".into(),
                format: ImageFormat::Jpeg,
                profiles: vec![("icc".into(), 64)],
            }]
        );
    }

    #[test]
    fn empty_profiles_are_not_reattached() {
        let backend = MockBackend::new().with_image(
            "/p/a.heic",
            vec![
                Profile::new(ProfileName::Exif, Vec::new()),
                icc(),
                Profile::new(ProfileName::Xmp, b"<x/>".to_vec()),
            ],
        );

        run(&backend, &["/p/a.heic"], &ConvertOptions::default());

        assert_eq!(
            backend.writes(),
            vec![RecordedOp::Write {
                output: "/p/a.jpg".into(),
                format: ImageFormat::Jpeg,
                profiles: vec![("icc".into(), 64), ("xmp".into(), 4)],
            }]
        );
    }

    #[test]
    fn image_without_profiles_still_converts() {
        let backend = MockBackend::new().with_image("/p/plain.heif", vec![]);
        let report = run(&backend, &["/p/plain.heif"], &ConvertOptions::default());
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn write_failure_is_recorded_and_batch_continues() {
        let backend = MockBackend::new()
            .with_image("/p/a.heif", vec![])
            .with_image("/p/b.heif", vec![])
            .with_write_error("/p/a.jpg", "disk full");

        let report = run(&backend, &["/p/a.heif", "/p/b.heif"], &ConvertOptions::default());

        assert!(matches!(
            &report.outcomes[0].status,
            TaskStatus::Failed { reason } if reason.contains("disk full")
        ));
        assert!(matches!(report.outcomes[1].status, TaskStatus::Succeeded { .. }));
    }

    #[test]
    fn one_outcome_per_task_in_order_with_duplicates() {
        let backend = MockBackend::new()
            .with_image("/p/a.heif", vec![])
            .with_decode_error("/p/b.heif", "bad");
        let paths = ["/p/a.heif", "/p/b.heif", "/p/missing.heif", "/p/a.heif"];

        let report = run(&backend, &paths, &ConvertOptions::default());

        let sources: Vec<_> = report
            .outcomes
            .iter()
            .map(|t| t.source.to_str().unwrap())
            .collect();
        assert_eq!(sources, paths);
        assert_eq!((report.succeeded(), report.failed()), (2, 2));
        assert!(!report.cancelled);
    }

    // =========================================================================
    // Alternate directory and path memory
    // =========================================================================

    #[test]
    fn alternate_dir_relocates_outputs_and_is_created() {
        let tmp = TempDir::new().unwrap();
        let exports = tmp.path().join("exports/nested");
        let backend = MockBackend::new().with_image("/photos/a.heif", vec![]);

        let options = ConvertOptions {
            alternate_dir: Some(exports.clone()),
            path_memory: None,
        };
        run(&backend, &["/photos/a.heif"], &options);

        assert!(exports.is_dir());
        assert_eq!(
            backend.writes(),
            vec![RecordedOp::Write {
                output: exports.join("a.jpg").to_string_lossy().into_owned(),
                format: ImageFormat::Jpeg,
                profiles: vec![],
            }]
        );
    }

    #[test]
    fn alternate_dir_is_remembered_once() {
        let tmp = TempDir::new().unwrap();
        let memory = PathMemory::at(tmp.path().join(MEMORY_FILE_NAME));
        let exports = tmp.path().join("exports");
        let backend = MockBackend::new()
            .with_image("/p/a.heif", vec![])
            .with_image("/p/b.heif", vec![]);

        let options = ConvertOptions {
            alternate_dir: Some(exports.clone()),
            path_memory: Some(memory.clone()),
        };
        run(&backend, &["/p/a.heif", "/p/b.heif"], &options);

        assert_eq!(memory.load().unwrap(), Some(exports));
    }

    #[test]
    fn empty_alternate_dir_writes_beside_source_and_remembers_nothing() {
        let tmp = TempDir::new().unwrap();
        let memory = PathMemory::at(tmp.path().join(MEMORY_FILE_NAME));
        let backend = MockBackend::new().with_image("/p/a.heif", vec![]);

        let options = ConvertOptions {
            alternate_dir: Some(PathBuf::new()),
            path_memory: Some(memory.clone()),
        };
        let report = run(&backend, &["/p/a.heif"], &options);

        assert_eq!(
            report.outcomes[0].status,
            TaskStatus::Succeeded {
                output: PathBuf::from("/p/a.jpg")
            }
        );
        assert!(!memory.file().exists());
    }

    #[test]
    fn memory_write_failure_does_not_abort() {
        let tmp = TempDir::new().unwrap();
        let memory = PathMemory::at(tmp.path().join("missing/LastUsedPath.txt"));
        let backend = MockBackend::new().with_image("/p/a.heif", vec![]);

        let options = ConvertOptions {
            alternate_dir: Some(tmp.path().join("out")),
            path_memory: Some(memory),
        };
        let report = run(&backend, &["/p/a.heif"], &options);
        assert_eq!(report.succeeded(), 1);
    }

    #[test]
    fn uncreatable_alternate_dir_fails_every_task() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"").unwrap();
        let backend = MockBackend::new()
            .with_image("/p/a.heif", vec![])
            .with_image("/p/b.heif", vec![]);

        let options = ConvertOptions {
            alternate_dir: Some(blocker.join("sub")),
            path_memory: None,
        };
        let report = run(&backend, &["/p/a.heif", "/p/b.heif"], &options);

        assert_eq!(report.failed(), 2);
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // Events and cancellation
    // =========================================================================

    #[test]
    fn events_follow_tasks() {
        let backend = MockBackend::new()
            .with_image("/p/a.heif", vec![])
            .with_decode_error("/p/b.heif", "bad");
        let (tx, rx) = mpsc::channel();

        convert_batch(
            &backend,
            tasks(&["/p/a.heif", "/p/b.heif"]),
            &ConvertOptions::default(),
            &CancelToken::new(),
            Some(&tx),
        );
        drop(tx);

        let events: Vec<_> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ConvertEvent::Started { total: 2 });
        assert!(matches!(&events[1], ConvertEvent::TaskFinished { index: 0, .. }));
        assert!(matches!(&events[2], ConvertEvent::TaskFinished { index: 1, .. }));
        assert_eq!(
            events[3],
            ConvertEvent::Finished {
                succeeded: 1,
                failed: 1
            }
        );
    }

    /// Cancels the batch while decoding a chosen file.
    struct CancellingBackend {
        inner: MockBackend,
        trigger: PathBuf,
        token: CancelToken,
    }

    impl ImageBackend for CancellingBackend {
        fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
            if path == self.trigger {
                self.token.cancel();
            }
            self.inner.decode(path)
        }

        fn write(&self, image: &DecodedImage, path: &Path) -> Result<(), BackendError> {
            self.inner.write(image, path)
        }
    }

    #[test]
    fn cancel_stops_remaining_tasks_but_finishes_current() {
        let token = CancelToken::new();
        let backend = CancellingBackend {
            inner: MockBackend::new()
                .with_image("/p/a.heif", vec![])
                .with_image("/p/b.heif", vec![])
                .with_image("/p/c.heif", vec![]),
            trigger: PathBuf::from("/p/b.heif"),
            token: token.clone(),
        };
        let (tx, rx) = mpsc::channel();

        let report = convert_batch(
            &backend,
            tasks(&["/p/a.heif", "/p/b.heif", "/p/c.heif"]),
            &ConvertOptions::default(),
            &token,
            Some(&tx),
        );
        drop(tx);

        assert!(report.cancelled);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(backend.inner.writes().len(), 2);
        assert!(
            rx.iter()
                .any(|e| e == ConvertEvent::Cancelled { remaining: 1 })
        );
    }

    #[test]
    fn cancelled_before_start_converts_nothing() {
        let backend = MockBackend::new().with_image("/p/a.heif", vec![]);
        let token = CancelToken::new();
        token.cancel();

        let report = convert_batch(
            &backend,
            tasks(&["/p/a.heif"]),
            &ConvertOptions::default(),
            &token,
            None,
        );
        assert!(report.outcomes.is_empty());
        assert_eq!(report.skipped, 1);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn spawned_batch_reports_through_handle() {
        let backend: Arc<dyn ImageBackend> = Arc::new(
            MockBackend::new()
                .with_image("/p/a.heif", vec![icc()])
                .with_decode_error("/p/b.heif", "bad"),
        );

        let handle = spawn_batch(
            backend,
            tasks(&["/p/a.heif", "/p/b.heif"]),
            ConvertOptions::default(),
        )
        .unwrap();
        let finished = handle
            .events()
            .iter()
            .filter(|e| matches!(e, ConvertEvent::TaskFinished { .. }))
            .count();
        let report = handle.join().unwrap();

        assert_eq!(finished, 2);
        assert_eq!((report.succeeded(), report.failed()), (1, 1));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let memory = PathMemory::at(tmp.path().join(MEMORY_FILE_NAME));
        let backend = MockBackend::new();
        let options = ConvertOptions {
            alternate_dir: Some(tmp.path().join("out")),
            path_memory: Some(memory.clone()),
        };

        let report = run(&backend, &[], &options);
        assert!(report.outcomes.is_empty());
        assert!(!memory.file().exists());
        assert!(!tmp.path().join("out").exists());
    }
}
