//! Session configuration loaded from TOML.
//!
//! A session file names the recorder output, the constant info fields
//! stamped into every CSV row, the user columns the experiment will record,
//! the replay start offset, and the engine parameters.
//!
//! ```toml
//! output = "s01_block2.csv"
//! start_offset = 0
//! columns = ["response", "correct"]
//!
//! [info]
//! listener = "s01"
//! condition = "quiet"
//!
//! [engine]
//! rate = 44100
//! num_channels = 8
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use resona_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a session file.
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a session file.
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML.
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Engine parameters carried by a session file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineSettings {
    /// Output sample rate in Hz.
    pub rate: u32,
    /// Number of discrete playback channels.
    pub num_channels: usize,
    /// Queue depth per channel.
    pub queue_size: usize,
    /// Frames per device buffer.
    pub stream_unit: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = EngineConfig::default();
        EngineSettings {
            rate: defaults.rate,
            num_channels: defaults.num_channels,
            queue_size: defaults.queue_size,
            stream_unit: defaults.stream_unit,
        }
    }
}

impl From<EngineSettings> for EngineConfig {
    fn from(settings: EngineSettings) -> Self {
        EngineConfig {
            rate: settings.rate,
            num_channels: settings.num_channels,
            queue_size: settings.queue_size,
            stream_unit: settings.stream_unit,
        }
    }
}

/// One session's configuration.
///
/// Info fields are stored in a sorted map, so their column order in the
/// recorder header is alphabetical and stable across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Recorder output path.
    pub output: PathBuf,

    /// Session-constant fields stamped into every row (listener id,
    /// condition, ...).
    #[serde(default)]
    pub info: BTreeMap<String, String>,

    /// User columns the experiment records.
    #[serde(default)]
    pub columns: Vec<String>,

    /// Skip recording until the offset counter reaches this value; moments
    /// still execute, so replayed state stays consistent.
    #[serde(default)]
    pub start_offset: u32,

    /// Engine parameters.
    #[serde(default)]
    pub engine: EngineSettings,
}

impl SessionConfig {
    /// A minimal configuration writing to `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        SessionConfig {
            output: output.into(),
            info: BTreeMap::new(),
            columns: Vec::new(),
            start_offset: 0,
            engine: EngineSettings::default(),
        }
    }

    /// Load a session file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Save a session file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = toml::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ConfigError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
    }
}
