//! Configuration management for the firehose decoder
//!
//! Handles loading, validating, and persisting decoder and output settings.
//! A missing config file is not an error: every field has a default.

use crate::cbor::MAX_DEPTH_LIMIT;
use crate::error::{FirehoseError, Result};
use crate::frame::{FrameOptions, TrailingBytes};
use crate::render::BytesRendering;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod defaults;

pub use defaults::*;

/// Main decoder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum nesting depth of arrays and maps
    #[serde(default = "defaults::default_max_depth")]
    pub max_depth: usize,

    /// Policy for bytes after the payload map
    #[serde(default)]
    pub trailing_bytes: TrailingBytes,

    /// How byte strings are rendered
    #[serde(default)]
    pub bytes: BytesRendering,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,

    /// Largest message accepted, in bytes
    #[serde(default = "defaults::default_max_message_bytes")]
    pub max_message_bytes: usize,

    /// Maximum inputs decoded concurrently
    #[serde(default = "defaults::default_parallelism")]
    pub parallelism: usize,

    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Tries in order:
    /// 1. XDG_CONFIG_HOME/firehose-cbor/config.toml
    /// 2. ~/.config/firehose-cbor/config.toml
    ///
    /// Falls back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| FirehoseError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| FirehoseError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| FirehoseError::SerializationError(e.to_string()))
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .and_then(|path| if path.is_empty() { None } else { Some(path) })
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")));

        config_home
            .ok_or_else(|| {
                FirehoseError::Internal(
                    "Could not determine config directory: XDG_CONFIG_HOME not set and no home directory found"
                        .to_string(),
                )
            })
            .map(|path| path.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(FirehoseError::InvalidConfig(
                "max_depth must be greater than 0".to_string(),
            ));
        }

        if self.max_depth > MAX_DEPTH_LIMIT {
            return Err(FirehoseError::InvalidConfig(format!(
                "max_depth must be at most {MAX_DEPTH_LIMIT}"
            )));
        }

        if self.max_message_bytes == 0 {
            return Err(FirehoseError::InvalidConfig(
                "max_message_bytes must be greater than 0".to_string(),
            ));
        }

        if self.parallelism == 0 {
            return Err(FirehoseError::InvalidConfig(
                "parallelism must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Frame decoding options derived from this configuration
    pub const fn frame_options(&self) -> FrameOptions {
        FrameOptions {
            max_depth: self.max_depth,
            trailing_bytes: self.trailing_bytes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            trailing_bytes: TrailingBytes::default(),
            bytes: BytesRendering::default(),
            pretty: false,
            max_message_bytes: default_max_message_bytes(),
            parallelism: default_parallelism(),
            verbose: false,
        }
    }
}
