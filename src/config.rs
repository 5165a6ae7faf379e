//! Service configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! the base layer; a user file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [server]
//! address = "localhost:12313"
//! max_upload_bytes = 1073741824   # 1 GiB
//! # static_dir = "frontend/dist"  # Serve a frontend from disk for unmatched paths
//!
//! [storage]
//! dir = "fileheap"                # Where thumbnails wait to be downloaded
//!
//! [thumbnail]
//! canvas = [400, 300]             # Output width, height
//! blur_sigma = 15.0               # Backdrop Gaussian blur
//! quality = 95                    # JPEG quality (1-100)
//! gravity = "centre"              # Backdrop crop anchor: centre|north|south|east|west
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Canvas, Gravity, Quality, ThumbnailConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Service configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Listener and request limits.
    pub server: ServerConfig,
    /// Where rendered thumbnails are parked until downloaded.
    pub storage: StorageConfig,
    /// Rendering parameters.
    pub thumbnail: ThumbnailSettings,
}

impl ServiceConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::Validation("server.address must not be empty".into()));
        }
        if self.server.max_upload_bytes == 0 {
            return Err(ConfigError::Validation("server.max_upload_bytes must be non-zero".into()));
        }
        if self.thumbnail.canvas[0] == 0 || self.thumbnail.canvas[1] == 0 {
            return Err(ConfigError::Validation("thumbnail.canvas values must be non-zero".into()));
        }
        if !(1..=100).contains(&self.thumbnail.quality) {
            return Err(ConfigError::Validation("thumbnail.quality must be 1-100".into()));
        }
        if !self.thumbnail.blur_sigma.is_finite() || self.thumbnail.blur_sigma < 0.0 {
            return Err(ConfigError::Validation(
                "thumbnail.blur_sigma must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// `host:port` to listen on.
    pub address: String,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Directory served for paths no route matches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "localhost:12313".to_string(),
            max_upload_bytes: 1 << 30,
            static_dir: None,
        }
    }
}

/// Thumbnail storage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("fileheap"),
        }
    }
}

/// Rendering settings, as written in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailSettings {
    /// Output size as `[width, height]`.
    pub canvas: [u32; 2],
    /// Gaussian blur sigma for the backdrop. `0` disables blurring.
    pub blur_sigma: f32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
    /// Which part of the backdrop survives the crop-to-fill.
    pub gravity: Gravity,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            canvas: [400, 300],
            blur_sigma: 15.0,
            quality: 95,
            gravity: Gravity::Centre,
        }
    }
}

impl From<&ThumbnailSettings> for ThumbnailConfig {
    fn from(settings: &ThumbnailSettings) -> Self {
        Self {
            canvas: Canvas::new(settings.canvas[0], settings.canvas[1]),
            blur_sigma: settings.blur_sigma,
            quality: Quality::new(settings.quality),
            gravity: settings.gravity,
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
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ServiceConfig::default()).expect("default config must serialize")
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

/// Merge an optional overlay onto the defaults, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ServiceConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ServiceConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the TOML file at `path`.
///
/// A missing file is not an error: the stock defaults are returned.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# blurframe configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
# host:port to listen on.
address = "localhost:12313"

# Largest accepted upload, in bytes (1 GiB).
max_upload_bytes = 1073741824

# Serve a frontend from this directory for paths no API route matches.
# Omit to serve only the built-in upload page.
# static_dir = "frontend/dist"

# ---------------------------------------------------------------------------
# Storage
# ---------------------------------------------------------------------------
[storage]
# Rendered thumbnails wait here until downloaded, then are deleted.
dir = "fileheap"

# ---------------------------------------------------------------------------
# Thumbnail rendering
# ---------------------------------------------------------------------------
[thumbnail]
# Output size as [width, height].
canvas = [400, 300]

# Gaussian blur applied to the backdrop. 0 disables blurring.
blur_sigma = 15.0

# JPEG encoding quality (1 = worst, 100 = best).
quality = 95

# Which part of the backdrop survives the crop-to-fill:
# "centre", "north", "south", "east" or "west".
gravity = "centre"
"##
}
