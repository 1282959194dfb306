//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the crate's only contract with the imaging
//! library. It covers the six things the converter and the preview loader
//! need:
//!
//! | Need | API |
//! |---|---|
//! | decode from path | [`ImageBackend::decode`] |
//! | render for display | [`ImageBackend::render_preview`] |
//! | enumerate named profiles with bytes | [`DecodedImage::profiles`] |
//! | set / replace a profile | [`DecodedImage::set_profile`] |
//! | change target format | [`DecodedImage::set_format`] |
//! | encode to path | [`ImageBackend::write`] |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): libheif for HEIF/HEIC,
//! the `image` crate for everything else and for JPEG encoding.

use super::calculations::calculate_fit_dimensions;
use super::params::{ImageFormat, PreviewBounds, PreviewImage};
use super::profiles::{Profile, ProfileSet};
use image::DynamicImage;
use image::imageops::FilterType;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("unsupported image: {0}")]
    Unsupported(String),
}

/// A decoded image together with its format tag and metadata profiles.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pixels: DynamicImage,
    format: ImageFormat,
    profiles: ProfileSet,
}

impl DecodedImage {
    pub fn new(pixels: DynamicImage, format: ImageFormat, profiles: ProfileSet) -> Self {
        Self {
            pixels,
            format,
            profiles,
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    pub fn profiles(&self) -> &ProfileSet {
        &self.profiles
    }

    /// Attach a profile, replacing one with the same name.
    pub fn set_profile(&mut self, profile: Profile) {
        self.profiles.set(profile);
    }

    /// Retarget the image to another format.
    ///
    /// Profiles belong to the source container, so switching to a different
    /// format detaches all of them. Callers that want metadata to survive
    /// must collect the profiles first and reattach them afterwards.
    pub fn set_format(&mut self, format: ImageFormat) {
        if self.format != format {
            self.profiles.clear();
            self.format = format;
        }
    }
}

/// Downscale decoded pixels into an RGBA preview that fits `bounds`.
pub fn fit_preview(source: &Path, pixels: &DynamicImage, bounds: PreviewBounds) -> PreviewImage {
    let (w, h) = calculate_fit_dimensions(
        (pixels.width(), pixels.height()),
        (bounds.max_width, bounds.max_height),
    );
    let rgba = if (w, h) == (pixels.width(), pixels.height()) {
        pixels.to_rgba8()
    } else {
        pixels.resize_exact(w, h, FilterType::Triangle).to_rgba8()
    };
    PreviewImage {
        source: source.to_path_buf(),
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}

/// Trait for image processing backends.
///
/// Backends are shared with the background conversion thread, hence
/// `Send + Sync`.
pub trait ImageBackend: Send + Sync {
    /// Decode an image and collect every metadata profile it carries.
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError>;

    /// Decode an image and scale it down for on-screen display.
    fn render_preview(
        &self,
        path: &Path,
        bounds: PreviewBounds,
    ) -> Result<PreviewImage, BackendError> {
        let image = self.decode(path)?;
        Ok(fit_preview(path, image.pixels(), bounds))
    }

    /// Encode `image` in its current format and write it to `path`,
    /// creating or overwriting the file. Attached profiles are embedded.
    fn write(&self, image: &DecodedImage, path: &Path) -> Result<(), BackendError>;
}
