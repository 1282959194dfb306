//! Preview loading for the currently highlighted file.
//!
//! Decoding happens on the caller's thread; a preview is one image, so the
//! cost is bounded and the caller always gets either a fresh surface or the
//! backend's error.

use crate::imaging::{BackendError, ImageBackend, PreviewBounds, PreviewImage};
use std::path::Path;

/// Decode `path` and scale it to fit within `bounds` as RGBA8.
pub fn load_preview(
    backend: &dyn ImageBackend,
    path: &Path,
    bounds: PreviewBounds,
) -> Result<PreviewImage, BackendError> {
    let preview = backend.render_preview(path, bounds)?;
    tracing::debug!(
        path = %path.display(),
        width = preview.width,
        height = preview.height,
        "loaded preview"
    );
    Ok(preview)
}
