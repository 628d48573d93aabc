//! Compression configuration module.
//!
//! Handles loading, validating, and merging `wicompress.toml`. Stock defaults
//! are the base layer; a user file only overrides the keys it names, and CLI
//! flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! quality = 0.6                    # Lossy encode quality (0.0-1.0)
//! never_grow = true                # Keep the original when re-encoding would not shrink it
//! live_photo_detection = "auto"    # "auto", "maker-metadata" or "orientation-tag"
//!
//! [output]
//! directory = "compressed"         # Where batch output is written
//!
//! [processing]
//! max_processes = 4                # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{LivePhotoDetection, Quality};
use crate::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Compression configuration loaded from `wicompress.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// Lossy encode quality, 0.0 (smallest) to 1.0 (best).
    pub quality: f32,
    /// Return the original bytes when re-encoding would not make them smaller.
    pub never_grow: bool,
    /// Which Live Photo check gates HEIF orientation correction.
    pub live_photo_detection: LivePhotoDetection,
    pub output: OutputConfig,
    pub processing: ProcessingConfig,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            quality: Quality::DEFAULT,
            never_grow: true,
            live_photo_detection: LivePhotoDetection::Auto,
            output: OutputConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl CompressConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(ConfigError::Validation(
                "quality must be between 0.0 and 1.0".into(),
            ));
        }
        if self.output.directory.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output.directory must not be empty".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn quality(&self) -> Quality {
        Quality::new(self.quality)
    }

    /// Override the quality from the command line. Out-of-range values are
    /// clamped and NaN falls back to the default, as for any API caller; only
    /// the config file is held to the strict range.
    pub fn set_quality(&mut self, quality: f32) {
        self.quality = Quality::new(quality).value();
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            never_grow: self.never_grow,
            live_photo_detection: self.live_photo_detection,
        }
    }
}

/// Batch output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory compressed files are written to.
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "compressed".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel compression workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(CompressConfig::default())?)
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
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but
/// contains invalid TOML.
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
) -> Result<CompressConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CompressConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults when it
/// does not exist.
pub fn load_config(path: &Path) -> Result<CompressConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    let config = resolve_config(base, overlay)?;
    tracing::debug!(path = %path.display(), ?config, "config resolved");
    Ok(config)
}

/// Returns a fully-commented stock `wicompress.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# wicompress configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override this file.
# Unknown keys will cause an error.

# Lossy encoding quality for JPEG and HEIF output.
# 0.0 = smallest file, 1.0 = best quality. PNG output is lossless and ignores it.
quality = 0.6

# When re-encoding would not make a file smaller, keep the original bytes.
# Guarantees that compressing an already-compressed photo never grows it.
never_grow = true

# How HEIF Live Photos are recognised before fixing their orientation:
#   "auto"             maker metadata when the codec can read it, else orientation tag
#   "maker-metadata"   Apple maker-note tags 17/18 or the HEIF Live Photo flag
#   "orientation-tag"  any EXIF orientation other than "up"
live_photo_detection = "auto"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory compressed files are written to.
directory = "compressed"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel compression workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
