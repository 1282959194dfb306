//! Application configuration.
//!
//! Settings live in an optional `bee-convert.toml`, looked up in the working
//! directory unless `--config` names another file. User values are merged on
//! top of stock defaults, so the file only needs the keys it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [preview]
//! max_width = 320           # Preview box, in pixels. Images are never upscaled.
//! max_height = 240
//!
//! [scan]
//! recursive = false         # Folder selection also descends into subfolders
//!
//! [memory]
//! # file = "/custom/LastUsedPath.txt"   # Default: beside the executable
//! ```
//!
//! JPEG quality is deliberately absent: every output is written at quality 92.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::PreviewBounds;
use crate::path_memory::{PathMemory, PathMemoryError};
use crate::selection::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "bee-convert.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Configuration loaded from `bee-convert.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Preview surface size.
    pub preview: PreviewConfig,
    /// Folder selection behaviour.
    pub scan: ScanConfig,
    /// Where the last alternate output directory is remembered.
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        let bounds = PreviewBounds::default();
        Self {
            max_width: bounds.max_width,
            max_height: bounds.max_height,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Include HEIF files in subfolders of a selected folder.
    pub recursive: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    /// Explicit path memory file. When absent, `LastUsedPath.txt` beside the
    /// executable is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preview.max_width == 0 || self.preview.max_height == 0 {
            return Err(ConfigError::Validation(
                "preview.max_width and preview.max_height must be non-zero".into(),
            ));
        }
        if let Some(file) = &self.memory.file
            && file.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "memory.file must not be empty (omit it to use the default)".into(),
            ));
        }
        Ok(())
    }

    pub fn preview_bounds(&self) -> PreviewBounds {
        PreviewBounds {
            max_width: self.preview.max_width,
            max_height: self.preview.max_height,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            recursive: self.scan.recursive,
        }
    }

    /// The configured path memory, or the one beside the executable.
    pub fn path_memory(&self) -> Result<PathMemory, PathMemoryError> {
        match &self.memory.file {
            Some(file) => Ok(PathMemory::at(file)),
            None => PathMemory::beside_executable(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to defaults if the file is absent.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Like [`load_config`], but a missing file is an error. Used for paths the
/// user named explicitly.
pub fn load_required_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    load_config(path)
}

/// Returns a fully-commented stock `bee-convert.toml` with all keys and
/// explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# bee-convert Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# The file is read from ./bee-convert.toml, or from the path given with
# --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Preview
# ---------------------------------------------------------------------------
[preview]
# Bounding box for the preview, in pixels. The aspect ratio is kept and
# small images are never enlarged.
max_width = 320
max_height = 240

# ---------------------------------------------------------------------------
# Folder selection
# ---------------------------------------------------------------------------
[scan]
# Also pick up .heif/.heic files in subfolders of the chosen folder.
recursive = false

# ---------------------------------------------------------------------------
# Output directory memory
# ---------------------------------------------------------------------------
[memory]
# File holding the last alternate output directory. Defaults to
# LastUsedPath.txt next to the bee-convert executable.
# file = "/path/to/LastUsedPath.txt"
"##
}
