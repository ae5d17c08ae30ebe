use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::corrections::StoreLocations;
use crate::recordings::{
    DEFAULT_BEAT_FILE_MARKER, DEFAULT_EVENT_FILE_MARKER, DEFAULT_ID_PATTERN, DiscoveryOptions,
    IdentityPattern, RecordingError,
};

fn default_id_pattern() -> String {
    DEFAULT_ID_PATTERN.to_string()
}

fn default_beat_marker() -> String {
    DEFAULT_BEAT_FILE_MARKER.to_string()
}

fn default_event_marker() -> String {
    DEFAULT_EVENT_FILE_MARKER.to_string()
}

/// Settings stored in `config.toml`.
///
/// Config keys (TOML): `id_pattern`, `data_folder`, `last_project`,
/// `discovery.beat_file_marker`, `discovery.event_file_marker`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestSettings {
    #[serde(default = "default_id_pattern")]
    pub id_pattern: String,
    /// Folder holding raw device exports.
    #[serde(default)]
    pub data_folder: Option<PathBuf>,
    /// Project opened most recently.
    #[serde(default)]
    pub last_project: Option<PathBuf>,
    #[serde(default)]
    pub discovery: DiscoverySettings,
}

/// Filename markers used to recognize export files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverySettings {
    #[serde(default = "default_beat_marker")]
    pub beat_file_marker: String,
    #[serde(default = "default_event_marker")]
    pub event_file_marker: String,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            beat_file_marker: default_beat_marker(),
            event_file_marker: default_event_marker(),
        }
    }
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            id_pattern: default_id_pattern(),
            data_folder: None,
            last_project: None,
            discovery: DiscoverySettings::default(),
        }
    }
}

impl IngestSettings {
    /// Discovery options built from these settings, optionally with another pattern.
    pub fn discovery_options(
        &self,
        pattern_override: Option<&str>,
    ) -> Result<DiscoveryOptions, RecordingError> {
        let pattern = IdentityPattern::new(pattern_override.unwrap_or(&self.id_pattern))?;
        Ok(DiscoveryOptions {
            pattern,
            beat_file_marker: self.discovery.beat_file_marker.clone(),
            event_file_marker: self.discovery.event_file_marker.clone(),
        })
    }

    /// Add project and data folder to `base`, preferring explicit paths over
    /// the saved ones.
    pub fn store_locations(
        &self,
        base: StoreLocations,
        project: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> StoreLocations {
        let mut locations = base;
        if let Some(project) = project.or_else(|| self.last_project.clone()) {
            locations = locations.with_project(project);
        }
        if let Some(data_dir) = data_dir.or_else(|| self.data_folder.clone()) {
            locations = locations.with_data_dir(data_dir);
        }
        locations
    }
}

/// Errors that can occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("No suitable config directory found")]
    NoConfigDir,
}
