//! Production backend: libheif for HEIF/HEIC, the `image` crate for the rest.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Format detection | `ftyp` brand sniffing ([`heif::is_heif`](super::heif::is_heif)), then `image::guess_format` |
//! | Decode HEIF/HEIC + ICC/EXIF/XMP | `libheif-rs` (feature `heif`) |
//! | Decode JPEG, PNG, TIFF, WebP | `image` crate decoders |
//! | Profiles of JPEG sources | [`jpeg_segments::read_profiles`](super::jpeg_segments::read_profiles) |
//! | ICC of other raster sources | `image::ImageDecoder::icc_profile` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at [`Quality::JPEG`] |
//! | Embed profiles | [`jpeg_segments::embed_profiles`](super::jpeg_segments::embed_profiles) |
//!
//! Detection goes by content, not extension: a `.heif` file that is really
//! a JPEG still converts, and a truncated file fails with the decoder's
//! message.

use super::backend::{BackendError, DecodedImage, ImageBackend};
use super::heif;
use super::jpeg_segments;
use super::params::{ImageFormat, Quality};
use super::profiles::{Profile, ProfileName, ProfileSet};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Backend built on libheif and the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend {
    quality: Quality,
}

impl RustBackend {
    pub fn new() -> Self {
        Self {
            quality: Quality::JPEG,
        }
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn raster_format(format: image::ImageFormat) -> Option<ImageFormat> {
    match format {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        image::ImageFormat::Tiff => Some(ImageFormat::Tiff),
        image::ImageFormat::WebP => Some(ImageFormat::WebP),
        _ => None,
    }
}

#[cfg(feature = "heif")]
fn decode_heif(path: &Path, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    heif::decode_heif(path, bytes)
}

#[cfg(not(feature = "heif"))]
fn decode_heif(path: &Path, _bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    Err(BackendError::Unsupported(format!(
        "{}: HEIF support not compiled in (build with the `heif` feature)",
        path.display()
    )))
}

/// Decode anything the `image` crate can read, with its profiles.
fn decode_raster(path: &Path, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    let decode_error = |e: image::ImageError| BackendError::Decode(format!("{}: {}", path.display(), e));

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)?;
    let format = reader
        .format()
        .and_then(raster_format)
        .ok_or_else(|| {
            BackendError::Unsupported(format!("{}: unrecognised image format", path.display()))
        })?;

    let mut decoder = reader.into_decoder().map_err(decode_error)?;
    let mut profiles = if format == ImageFormat::Jpeg {
        jpeg_segments::read_profiles(bytes).unwrap_or_default()
    } else {
        ProfileSet::new()
    };
    if profiles.get(&ProfileName::Icc).is_none()
        && let Ok(Some(icc)) = decoder.icc_profile()
    {
        profiles.set(Profile::new(ProfileName::Icc, icc));
    }

    let pixels = DynamicImage::from_decoder(decoder).map_err(decode_error)?;
    Ok(DecodedImage::new(pixels, format, profiles))
}

/// Encode as JPEG into memory and splice in the attached profiles.
fn encode_jpeg(image: &DecodedImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel
    let rgb = image.pixels().to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality.value() as u8)
        .encode_image(&rgb)
        .map_err(|e| BackendError::Encode(e.to_string()))?;

    let profiles: Vec<Profile> = image.profiles().iter().cloned().collect();
    let (bytes, skipped) = jpeg_segments::embed_profiles(&encoded, &profiles)
        .map_err(|e| BackendError::Encode(e.to_string()))?;
    for name in skipped {
        tracing::warn!("profile '{name}' has no JPEG carrier and was not written");
    }
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn decode(&self, path: &Path) -> Result<DecodedImage, BackendError> {
        let bytes = std::fs::read(path)?;
        if heif::is_heif(&bytes) {
            decode_heif(path, &bytes)
        } else {
            decode_raster(path, &bytes)
        }
    }

    fn write(&self, image: &DecodedImage, path: &Path) -> Result<(), BackendError> {
        let bytes = match image.format() {
            ImageFormat::Jpeg => encode_jpeg(image, self.quality)?,
            other => {
                return Err(BackendError::Unsupported(format!(
                    "writing {other} is not supported, retarget to JPEG first"
                )));
            }
        };
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
