//! Shared test utilities for the bee-convert test suite.
//!
//! Most fixtures are synthesised with the `image` crate: JPEG content
//! written under a `.heif` name goes through the same content-sniffing path
//! as a real HEIF file. The one real HEIC, `fixtures/heic/rotated.heic`,
//! covers the libheif decoder (see [`rotated_heic`]).
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = tempfile::TempDir::new().unwrap();
//! let source = tmp.path().join("a.heif");
//! write_test_jpeg(&source, 64, 48, &sample_profiles());
//! ```

use crate::imaging::jpeg_segments::embed_profiles;
use crate::imaging::{Profile, ProfileName};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb, RgbImage};
use std::path::Path;

// =========================================================================
// Profiles
// =========================================================================

/// A small ICC-shaped block. Only the bytes matter, not colour accuracy.
pub fn sample_icc() -> Profile {
    let mut data = vec![0u8; 128];
    data[0..4].copy_from_slice(&128u32.to_be_bytes());
    data[36..40].copy_from_slice(b"acsp");
    Profile::new(ProfileName::Icc, data)
}

pub fn sample_profiles() -> Vec<Profile> {
    vec![
        sample_icc(),
        Profile::new(ProfileName::Exif, b"MM\0*\0\0\0\x08\0\0".to_vec()),
        Profile::new(
            ProfileName::Xmp,
            b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"></x:xmpmeta>".to_vec(),
        ),
        Profile::new(ProfileName::Iptc, b"8BIM\x04\x04\0\0\0\0\0\0".to_vec()),
    ]
}

// =========================================================================
// Image fixtures
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Write a JPEG with `profiles` embedded, under whatever name `path` has.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32, profiles: &[Profile]) {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 90)
        .encode_image(&gradient(width, height))
        .unwrap();
    let (bytes, skipped) = embed_profiles(&encoded, profiles).unwrap();
    assert!(skipped.is_empty(), "fixture profiles must all be embeddable");
    std::fs::write(path, bytes).unwrap();
}

pub fn write_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height).save(path).unwrap();
}

/// Write bytes no decoder accepts.
pub fn write_corrupt(path: &Path) {
    std::fs::write(path, b"\0\0\0\x18ftypheic truncated").unwrap();
}

// =========================================================================
// HEIC fixture
// =========================================================================

/// Path of the checked-in HEIC fixture, regenerated by
/// `fixtures/heic/generate.py`.
///
/// Stored as 64x32 pixels, left half red and right half blue, with an
/// `irot` transform and EXIF Orientation 6. Carries [`rotated_heic_profiles`].
#[cfg(feature = "heif")]
pub fn rotated_heic() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/heic/rotated.heic")
}

/// Profiles embedded in [`rotated_heic`], as the decoder should report them.
#[cfg(feature = "heif")]
pub fn rotated_heic_profiles() -> Vec<Profile> {
    let mut icc = vec![0u8; 256];
    icc[0..4].copy_from_slice(&256u32.to_be_bytes());
    icc[36..40].copy_from_slice(b"acsp");
    icc[128..136].copy_from_slice(b"fixture!");

    // Big-endian TIFF with one IFD0 entry: Orientation = 6
    let exif = b"MM\0*\0\0\0\x08\0\x01\x01\x12\0\x03\0\0\0\x01\0\x06\0\0\0\0\0\0".to_vec();

    vec![
        Profile::new(ProfileName::Icc, icc),
        Profile::new(ProfileName::Exif, exif),
        Profile::new(
            ProfileName::Xmp,
            b"<x:xmpmeta xmlns:x=\"adobe:ns:meta/\"><rdf:RDF/></x:xmpmeta>".to_vec(),
        ),
    ]
}
