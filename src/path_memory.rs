//! Remembers the last alternate output directory between sessions.
//!
//! The directory string is kept in a plain text file, `LastUsedPath.txt`,
//! next to the executable. The file holds exactly one path, is overwritten
//! on every save, and its absence simply means nothing has been remembered.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MEMORY_FILE_NAME: &str = "LastUsedPath.txt";

#[derive(Error, Debug)]
pub enum PathMemoryError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot locate the running executable: {0}")]
    NoExecutable(#[source] io::Error),
}

/// Handle on the path memory file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMemory {
    file: PathBuf,
}

impl PathMemory {
    /// Memory file beside the running executable.
    pub fn beside_executable() -> Result<Self, PathMemoryError> {
        let exe = std::env::current_exe().map_err(PathMemoryError::NoExecutable)?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::at(dir.join(MEMORY_FILE_NAME)))
    }

    /// Memory kept in an explicit file.
    pub fn at(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The remembered directory, or `None` if the file is absent or empty.
    pub fn load(&self) -> Result<Option<PathBuf>, PathMemoryError> {
        let contents = match fs::read_to_string(&self.file) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PathMemoryError::Io {
                    path: self.file.clone(),
                    source,
                });
            }
        };

        let value = contents
            .strip_suffix("\r\n")
            .or_else(|| contents.strip_suffix('\n'))
            .unwrap_or(&contents);
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(PathBuf::from(value)))
        }
    }

    /// Overwrite the memory with exactly `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), PathMemoryError> {
        fs::write(&self.file, dir.as_os_str().as_encoded_bytes()).map_err(|source| {
            PathMemoryError::Io {
                path: self.file.clone(),
                source,
            }
        })?;
        tracing::debug!(file = %self.file.display(), dir = %dir.display(), "saved path memory");
        Ok(())
    }
}
