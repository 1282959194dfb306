//! End-to-end conversion through the public API with the real backend.
//!
//! Fixtures are JPEG content saved under `.heif` names: the backend detects
//! formats by content, so these exercise the full decode → profiles →
//! retarget → reattach → write path without HEIF sample files.
//!
//! Run with: cargo test --test batch_conversion

use bee_convert::convert::{CancelToken, ConvertOptions, convert_batch};
use bee_convert::imaging::jpeg_segments::{embed_profiles, read_profiles};
use bee_convert::imaging::{Profile, ProfileName, RustBackend};
use bee_convert::path_memory::{MEMORY_FILE_NAME, PathMemory};
use bee_convert::results::ResultsLog;
use bee_convert::selection::{ScanOptions, Selection, TaskStatus};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, Rgb};
use std::path::Path;
use tempfile::TempDir;

fn icc_profile() -> Profile {
    let mut data = vec![0u8; 256];
    data[0..4].copy_from_slice(&256u32.to_be_bytes());
    data[36..40].copy_from_slice(b"acsp");
    Profile::new(ProfileName::Icc, data)
}

fn write_jpeg_fixture(path: &Path, profiles: &[Profile]) {
    let pixels = ImageBuffer::from_fn(40, 30, |x, y| Rgb([x as u8 * 6, y as u8 * 8, 90]));
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, 90)
        .encode_image(&pixels)
        .unwrap();
    let (bytes, _) = embed_profiles(&encoded, profiles).unwrap();
    std::fs::write(path, bytes).unwrap();
}

fn convert_folder(dir: &Path, options: &ConvertOptions) -> (ResultsLog, Vec<TaskStatus>) {
    let selection = Selection::from_folder(dir, &ScanOptions::default()).unwrap();
    let report = convert_batch(
        &RustBackend::new(),
        selection.tasks().to_vec(),
        options,
        &CancelToken::new(),
        None,
    );
    let mut log = ResultsLog::new();
    for task in &report.outcomes {
        log.record(task);
    }
    let statuses = report.outcomes.into_iter().map(|t| t.status).collect();
    (log, statuses)
}

#[test]
fn good_and_corrupt_file_in_folder() {
    let tmp = TempDir::new().unwrap();
    write_jpeg_fixture(&tmp.path().join("a.heif"), &[icc_profile()]);
    std::fs::write(tmp.path().join("b.heif"), b"not an image at all").unwrap();

    let (log, statuses) = convert_folder(tmp.path(), &ConvertOptions::default());

    assert_eq!(statuses.len(), 2);
    assert_eq!(log.entries()[0], "✓ Converted: a.jpg");
    assert!(log.entries()[1].starts_with("✗ Failed: b.heif ("));

    let output = tmp.path().join("a.jpg");
    let written = read_profiles(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(written.get(&ProfileName::Icc), Some(&icc_profile()));
    assert!(!tmp.path().join("b.jpg").exists());
}

#[test]
fn every_non_empty_profile_survives() {
    let tmp = TempDir::new().unwrap();
    let profiles = vec![
        icc_profile(),
        Profile::new(ProfileName::Exif, b"II*\0\x08\0\0\0\0\0".to_vec()),
        Profile::new(ProfileName::Xmp, b"<x:xmpmeta/>".to_vec()),
        Profile::new(ProfileName::Iptc, b"8BIM\x04\x04\0\0\0\0\0\0".to_vec()),
    ];
    write_jpeg_fixture(&tmp.path().join("IMG_0001.HEIC"), &profiles);

    let (log, _) = convert_folder(tmp.path(), &ConvertOptions::default());
    assert_eq!(log.entries(), ["✓ Converted: IMG_0001.jpg"]);

    let written = read_profiles(&std::fs::read(tmp.path().join("IMG_0001.jpg")).unwrap()).unwrap();
    for profile in &profiles {
        assert_eq!(written.get(&profile.name), Some(profile), "{}", profile.name);
    }
}

#[test]
fn file_without_profiles_gets_none() {
    let tmp = TempDir::new().unwrap();
    write_jpeg_fixture(&tmp.path().join("plain.heif"), &[]);

    convert_folder(tmp.path(), &ConvertOptions::default());

    let written = read_profiles(&std::fs::read(tmp.path().join("plain.jpg")).unwrap()).unwrap();
    assert!(written.is_empty());
}

#[test]
fn alternate_dir_receives_outputs_and_is_remembered() {
    let tmp = TempDir::new().unwrap();
    let sources = tmp.path().join("sources");
    let exports = tmp.path().join("exports");
    std::fs::create_dir_all(&sources).unwrap();
    write_jpeg_fixture(&sources.join("a.heif"), &[icc_profile()]);
    write_jpeg_fixture(&sources.join("b.heic"), &[]);

    let memory = PathMemory::at(tmp.path().join(MEMORY_FILE_NAME));
    let options = ConvertOptions {
        alternate_dir: Some(exports.clone()),
        path_memory: Some(memory.clone()),
    };
    let (log, _) = convert_folder(&sources, &options);

    assert_eq!(log.entries(), ["✓ Converted: a.jpg", "✓ Converted: b.jpg"]);
    assert!(exports.join("a.jpg").is_file());
    assert!(exports.join("b.jpg").is_file());
    assert!(!sources.join("a.jpg").exists());
    assert_eq!(memory.load().unwrap(), Some(exports));
}

#[test]
fn existing_output_is_overwritten() {
    let tmp = TempDir::new().unwrap();
    write_jpeg_fixture(&tmp.path().join("a.heif"), &[]);
    std::fs::write(tmp.path().join("a.jpg"), b"stale").unwrap();

    let (_, statuses) = convert_folder(tmp.path(), &ConvertOptions::default());

    assert!(matches!(statuses[0], TaskStatus::Succeeded { .. }));
    let bytes = std::fs::read(tmp.path().join("a.jpg")).unwrap();
    assert!(bytes.starts_with(&[0xFF, 0xD8]));
}

#[cfg(feature = "heif")]
#[test]
fn real_heic_keeps_profiles_and_stored_orientation() {
    use bee_convert::imaging::ImageBackend;

    let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/heic/rotated.heic");
    let tmp = TempDir::new().unwrap();
    let source = tmp.path().join("IMG_0001.HEIC");
    std::fs::copy(&fixture, &source).unwrap();

    let decoded = RustBackend::new().decode(&source).unwrap();
    let source_profiles = decoded.profiles().clone();
    assert_eq!(source_profiles.get(&ProfileName::Icc).map(|p| p.len()), Some(256));
    assert!(source_profiles.get(&ProfileName::Exif).unwrap().data.starts_with(b"MM\0*"));
    assert!(source_profiles.get(&ProfileName::Xmp).is_some());

    let (log, _) = convert_folder(tmp.path(), &ConvertOptions::default());
    assert_eq!(log.entries(), ["✓ Converted: IMG_0001.jpg"]);

    let output = tmp.path().join("IMG_0001.jpg");
    let written = read_profiles(&std::fs::read(&output).unwrap()).unwrap();
    for profile in source_profiles.iter() {
        assert_eq!(written.get(&profile.name), Some(profile), "{}", profile.name);
    }

    // EXIF still says Orientation 6, so the pixels must not be pre-rotated
    let jpeg = image::open(&output).unwrap();
    assert_eq!((jpeg.width(), jpeg.height()), (64, 32));
}
