//! Parameter types for image operations.
//!
//! These types describe *what* the backend should produce, not *how*. They
//! are shared between the conversion loop, the preview loader and the
//! backends, so swapping in a mock backend needs no changes elsewhere.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100).
//! - [`ImageFormat`]: Container/codec an image is tagged with.
//! - [`PreviewBounds`]: Box a preview must fit in.
//! - [`PreviewImage`]: Decoded, downscaled RGBA pixels ready for display.

use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    /// Quality every JPEG is written with. Not user-configurable.
    pub const JPEG: Quality = Quality(92);

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::JPEG
    }
}

/// Format an image is tagged with.
///
/// Decoding sets it from the source; the converter retargets it to
/// [`ImageFormat::Jpeg`] before writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Heif,
    Jpeg,
    Png,
    Tiff,
    WebP,
}

impl ImageFormat {
    pub const fn extension(self) -> &'static str {
        match self {
            ImageFormat::Heif => "heif",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Tiff => "tiff",
            ImageFormat::WebP => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Heif => "HEIF",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::WebP => "WebP",
        };
        f.write_str(name)
    }
}

/// Maximum preview size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewBounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewBounds {
    fn default() -> Self {
        Self {
            max_width: 320,
            max_height: 240,
        }
    }
}

/// A rendered preview: tightly packed RGBA8 rows.
#[derive(Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

// Hand-written so the pixel buffer does not flood debug output.
impl fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewImage")
            .field("source", &self.source)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rgba_len", &self.rgba.len())
            .finish()
    }
}
