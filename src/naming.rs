//! Output file naming.
//!
//! Every converted file keeps its base name and gets a `.jpg` extension.
//! Where it lands depends on the alternate output directory:
//!
//! - `photos/IMG_0001.HEIC`, no alternate directory → `photos/IMG_0001.jpg`
//! - `photos/IMG_0001.HEIC`, alternate `/exports` → `/exports/IMG_0001.jpg`
//! - `photos/archive.tar.heif` → `photos/archive.tar.jpg` (only the last
//!   extension is replaced)
//!
//! An alternate directory that is present but empty counts as unset, the
//! same as an empty text field in the desktop window.

use crate::imaging::ImageFormat;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Extension every converted file gets.
pub const OUTPUT_EXTENSION: &str = ImageFormat::Jpeg.extension();

/// Returns the alternate directory if it is set and non-empty.
pub fn effective_alternate_dir(alternate: Option<&Path>) -> Option<&Path> {
    alternate.filter(|dir| !dir.as_os_str().is_empty())
}

/// Derive the JPEG output path for `source`.
///
/// The extension is replaced with `.jpg`; when `alternate` is set and
/// non-empty, the resulting file name is relocated into it.
pub fn output_path(source: &Path, alternate: Option<&Path>) -> PathBuf {
    let renamed = source.with_extension(OUTPUT_EXTENSION);
    match effective_alternate_dir(alternate) {
        Some(dir) => dir.join(
            renamed
                .file_name()
                .unwrap_or_else(|| OsStr::new("unnamed.jpg")),
        ),
        None => renamed,
    }
}

/// File name component for display in result lines, falling back to the
/// whole path when there is none.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_extension_in_place() {
        assert_eq!(
            output_path(Path::new("/photos/a.heif"), None),
            PathBuf::from("/photos/a.jpg")
        );
    }

    #[test]
    fn uppercase_heic_extension_replaced() {
        assert_eq!(
            output_path(Path::new("/photos/IMG_0001.HEIC"), None),
            PathBuf::from("/photos/IMG_0001.jpg")
        );
    }

    #[test]
    fn only_last_extension_replaced() {
        assert_eq!(
            output_path(Path::new("/photos/archive.tar.heif"), None),
            PathBuf::from("/photos/archive.tar.jpg")
        );
    }

    #[test]
    fn relocates_into_alternate_dir() {
        assert_eq!(
            output_path(Path::new("/photos/a.heif"), Some(Path::new("/exports"))),
            PathBuf::from("/exports/a.jpg")
        );
    }

    #[test]
    fn empty_alternate_dir_counts_as_unset() {
        assert_eq!(
            output_path(Path::new("/photos/a.heif"), Some(Path::new(""))),
            PathBuf::from("/photos/a.jpg")
        );
        assert_eq!(effective_alternate_dir(Some(Path::new(""))), None);
    }

    #[test]
    fn relative_source_stays_relative() {
        assert_eq!(
            output_path(Path::new("a.heic"), None),
            PathBuf::from("a.jpg")
        );
    }

    #[test]
    fn display_name_is_file_name() {
        assert_eq!(display_name(Path::new("/photos/b.heif")), "b.heif");
        assert_eq!(display_name(Path::new("/")), "/");
    }
}
