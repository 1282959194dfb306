//! HEIF/HEIC container handling.
//!
//! Detection and EXIF unwrapping are plain byte work and always compiled.
//! Decoding goes through `libheif-rs` and needs the `heif` feature.
//!
//! HEIF stores EXIF as an item whose payload starts with a 4-byte big-endian
//! offset to the TIFF header (usually 6, skipping an `Exif\0\0` marker).
//! Profiles in this crate carry the bare TIFF block, so the prefix is
//! removed on the way in.
//!
//! Decoding leaves `irot`/`imir` unapplied. The EXIF Orientation tag is
//! carried over unchanged, so the output pixels must be the stored ones.

/// Major brands of HEIF still images and sequences (ISO/IEC 23008-12).
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"hevc", b"hevx", b"heim", b"heis", b"mif1", b"msf1", b"heif",
];

/// Returns true when `header` starts with an ISO-BMFF `ftyp` box whose major
/// brand is a HEIF brand. Needs at least the first 12 bytes of the file.
pub fn is_heif(header: &[u8]) -> bool {
    header.len() >= 12
        && &header[4..8] == b"ftyp"
        && HEIF_BRANDS.iter().any(|brand| header[8..12] == **brand)
}

/// Strip the HEIF EXIF item prefix and return the TIFF-structured block.
///
/// Malformed offsets fall back to everything after the 4 offset bytes.
pub fn exif_tiff_payload(block: &[u8]) -> &[u8] {
    if block.len() < 4 {
        return block;
    }
    let offset = u32::from_be_bytes([block[0], block[1], block[2], block[3]]) as usize;
    let rest = match 4usize.checked_add(offset) {
        Some(start) if start <= block.len() => &block[start..],
        _ => &block[4..],
    };
    rest.strip_prefix(b"Exif\0\0").unwrap_or(rest)
}

#[cfg(feature = "heif")]
pub(crate) use decoder::decode_heif;

#[cfg(feature = "heif")]
mod decoder {
    use super::exif_tiff_payload;
    use crate::imaging::backend::{BackendError, DecodedImage};
    use crate::imaging::params::ImageFormat;
    use crate::imaging::profiles::{Profile, ProfileName, ProfileSet};
    use image::{DynamicImage, RgbImage, RgbaImage};
    use libheif_rs::{
        ColorSpace, DecodingOptions, HeifContext, ImageHandle, ItemId, LibHeif, RgbChroma,
    };
    use std::path::Path;

    const XMP_CONTENT_TYPE: &str = "application/rdf+xml";

    fn decode_error(path: &Path, err: impl std::fmt::Display) -> BackendError {
        BackendError::Decode(format!("{}: {}", path.display(), err))
    }

    fn metadata_ids(handle: &ImageHandle, kind: &[u8]) -> Vec<ItemId> {
        let count = handle.number_of_metadata_blocks(kind);
        if count <= 0 {
            return Vec::new();
        }
        let mut ids: Vec<ItemId> = vec![0; count as usize];
        let found = handle.metadata_block_ids(&mut ids, kind);
        ids.truncate(found);
        ids
    }

    /// Collect the colour profile plus EXIF and XMP items of the primary image.
    ///
    /// Unreadable metadata items are logged and skipped; the pixels are still
    /// worth converting.
    fn read_profiles(path: &Path, handle: &ImageHandle) -> ProfileSet {
        let mut profiles = ProfileSet::new();

        if let Some(icc) = handle.color_profile_raw() {
            profiles.set(Profile::new(ProfileName::Icc, icc.data));
        }

        for id in metadata_ids(handle, b"Exif") {
            match handle.metadata(id) {
                Ok(block) => profiles.set(Profile::new(
                    ProfileName::Exif,
                    exif_tiff_payload(&block),
                )),
                Err(e) => tracing::warn!(path = %path.display(), "skipping EXIF item {id}: {e}"),
            }
        }

        for id in metadata_ids(handle, b"mime") {
            if handle.metadata_content_type(id) != Some(XMP_CONTENT_TYPE) {
                continue;
            }
            match handle.metadata(id) {
                Ok(packet) => profiles.set(Profile::new(ProfileName::Xmp, packet)),
                Err(e) => tracing::warn!(path = %path.display(), "skipping XMP item {id}: {e}"),
            }
        }

        profiles
    }

    /// Decode the primary image of a HEIF file to 8-bit RGB(A), without
    /// applying its rotation or mirroring.
    pub(crate) fn decode_heif(path: &Path, bytes: &[u8]) -> Result<DecodedImage, BackendError> {
        let ctx = HeifContext::read_from_bytes(bytes).map_err(|e| decode_error(path, e))?;
        let handle = ctx
            .primary_image_handle()
            .map_err(|e| decode_error(path, e))?;

        let has_alpha = handle.has_alpha_channel();
        let chroma = if has_alpha {
            RgbChroma::Rgba
        } else {
            RgbChroma::Rgb
        };
        // Pixels stay in stored orientation; the EXIF Orientation tag that
        // travels with them describes the irot/imir transform instead.
        let mut options = DecodingOptions::new()
            .ok_or_else(|| decode_error(path, "could not allocate decoding options"))?;
        options.set_ignore_transformations(true);
        let lib = LibHeif::new();
        let decoded = lib
            .decode(&handle, ColorSpace::Rgb(chroma), Some(options))
            .map_err(|e| decode_error(path, e))?;

        let planes = decoded.planes();
        let plane = planes
            .interleaved
            .ok_or_else(|| decode_error(path, "decoder returned no interleaved plane"))?;

        // Rows may be padded; copy only the visible bytes of each
        let channels = if has_alpha { 4 } else { 3 };
        let row_len = plane.width as usize * channels;
        let mut pixels = Vec::with_capacity(row_len * plane.height as usize);
        for row in plane.data.chunks(plane.stride).take(plane.height as usize) {
            pixels.extend_from_slice(&row[..row_len]);
        }

        let (w, h) = (plane.width, plane.height);
        let image = if has_alpha {
            RgbaImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgba8)
        } else {
            RgbImage::from_raw(w, h, pixels).map(DynamicImage::ImageRgb8)
        }
        .ok_or_else(|| decode_error(path, "decoded plane is smaller than its dimensions"))?;

        let profiles = read_profiles(path, &handle);
        tracing::debug!(
            path = %path.display(),
            width = w,
            height = h,
            profiles = profiles.len(),
            "decoded HEIF"
        );
        Ok(DecodedImage::new(image, ImageFormat::Heif, profiles))
    }
}
