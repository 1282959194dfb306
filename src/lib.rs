//! # bee-convert
//!
//! Batch-convert HEIF/HEIC photos to JPEG while keeping the metadata that
//! matters: colour profile, EXIF, XMP and IPTC.
//!
//! # Flow
//!
//! ```text
//! select ─→ preview (one file, on demand) ─→ convert (whole selection) ─→ results
//! ```
//!
//! 1. **Select**: pick files, or scan a folder for `.heif`/`.heic`.
//! 2. **Preview**: decode one file into a small RGBA surface.
//! 3. **Convert**: for each file, decode, collect non-empty profiles,
//!    retarget to JPEG, reattach the profiles and write `<name>.jpg` beside
//!    the source or into an alternate folder.
//! 4. **Results**: one `✓ Converted` / `✗ Failed` line per file.
//!
//! A failing file never stops the batch. The alternate folder is remembered
//! between sessions in `LastUsedPath.txt` beside the executable.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`selection`] | Ordered task list from picked files or a folder scan |
//! | [`preview`] | Bounded RGBA preview of one file |
//! | [`convert`] | The batch loop, on the caller's thread or a worker with cancellation |
//! | [`path_memory`] | `LastUsedPath.txt` load/save |
//! | [`results`] | Result line formatting and the append-only results list |
//! | [`naming`] | `.jpg` output path derivation |
//! | [`imaging`] | `ImageBackend` trait, libheif/`image` backend, profiles, JPEG segment codec |
//! | [`app`] | Explicit application state driving the desktop window |
//! | [`config`] | `bee-convert.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//! | `gui` | eframe window over [`app::AppState`] (feature `gui`) |
//!
//! # Design Decisions
//!
//! ## One Backend Trait
//!
//! Everything that touches pixels or container formats goes through
//! [`imaging::ImageBackend`]. The conversion loop, the preview loader and the
//! app state only see decoded images and named byte blocks, so they are
//! tested against a recording mock without any image files.
//!
//! ## Profiles Are Reattached, Not Copied Through
//!
//! Retargeting an image to JPEG detaches the profiles of its source
//! container. The converter collects the non-empty ones first and attaches
//! them again afterwards; JPEG writing then splices them in as APPn
//! segments. An empty profile is treated as absent.
//!
//! ## State Is Explicit
//!
//! The window owns an [`app::AppState`] and renders it. Conversion runs on a
//! worker thread and reports over a channel; the window drains the channel
//! each frame. The same state and operations are exercised headless in tests.

pub mod app;
pub mod config;
pub mod convert;
#[cfg(feature = "gui")]
pub mod gui;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod path_memory;
pub mod preview;
pub mod results;
pub mod selection;

#[cfg(test)]
pub(crate) mod test_helpers;
