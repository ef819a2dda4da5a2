//! Configuration management for deadlines.
//!
//! Settings live in `<data dir>/config.yaml`. A missing file means defaults;
//! `ensure_config_in` writes the defaults out so they can be edited.

use crate::error::{Error, Result};
use crate::images::{CompressOptions, MimeType};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default storage quota for the task collection (5 MiB).
pub const DEFAULT_STORAGE_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Default longest side of a stored cover image, in pixels.
pub const DEFAULT_COVER_MAX_SIZE: u32 = 1600;

/// Default encoder quality for cover images.
pub const DEFAULT_COVER_QUALITY: f32 = 0.85;

/// Tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Maximum size of the serialized task collection, in bytes.
    #[serde(default = "default_quota")]
    pub storage_quota_bytes: usize,

    /// Longest side of a stored cover image.
    #[serde(default = "default_cover_max_size")]
    pub cover_max_size: u32,

    /// Encoder quality in `0.0..=1.0`.
    #[serde(default = "default_cover_quality")]
    pub cover_quality: f32,

    /// Encoding used for stored cover images.
    #[serde(default)]
    pub cover_format: MimeType,

    /// Whether to append events to `events.jsonl`.
    #[serde(default)]
    pub debug_logging: bool,
}

const fn default_quota() -> usize {
    DEFAULT_STORAGE_QUOTA_BYTES
}

const fn default_cover_max_size() -> u32 {
    DEFAULT_COVER_MAX_SIZE
}

const fn default_cover_quality() -> f32 {
    DEFAULT_COVER_QUALITY
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_quota_bytes: DEFAULT_STORAGE_QUOTA_BYTES,
            cover_max_size: DEFAULT_COVER_MAX_SIZE,
            cover_quality: DEFAULT_COVER_QUALITY,
            cover_format: MimeType::default(),
            debug_logging: false,
        }
    }
}

impl Config {
    /// Load config from a data directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or holds
    /// out-of-range values.
    pub fn load_from(data_dir: &Path) -> Result<Option<Self>> {
        let config_path = paths::config_path(data_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Load config from a data directory, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        Ok(Self::load_from(data_dir)?.unwrap_or_default())
    }

    /// Save config to a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, data_dir: &Path) -> Result<()> {
        let config_path = paths::config_path(data_dir);
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Check that values are in range.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.cover_quality) {
            return Err(Error::Config(format!(
                "cover_quality must be between 0 and 1, got {}",
                self.cover_quality
            )));
        }
        if self.cover_max_size == 0 {
            return Err(Error::Config("cover_max_size must be positive".to_string()));
        }
        Ok(())
    }

    /// Compression settings for cover images attached through the form.
    #[must_use]
    pub const fn cover_compression(&self) -> CompressOptions {
        CompressOptions {
            max_size: self.cover_max_size,
            quality: self.cover_quality,
            mime_type: self.cover_format,
        }
    }
}

/// Ensure a config file exists in `data_dir`, writing defaults if not.
///
/// # Errors
///
/// Returns an error if config cannot be loaded or saved.
pub fn ensure_config_in(data_dir: &Path) -> Result<Config> {
    if let Some(config) = Config::load_from(data_dir)? {
        return Ok(config);
    }

    let config = Config::default();
    config.save_to(data_dir)?;
    Ok(config)
}
