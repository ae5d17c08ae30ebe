use std::path::PathBuf;

use thiserror::Error;

use crate::app_dirs::AppDirError;

/// Errors that abort a correction-store write or delete.
///
/// Reads never return these; they degrade to warnings instead.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// Failed to create the processed directory.
    #[error("Unable to create directory {path}: {source}")]
    CreateDir {
        /// Directory that failed to create.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write a record.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to serialize a record to YAML.
    #[error("Failed to serialize {path}: {source}")]
    SerializeYaml {
        /// Destination path.
        path: PathBuf,
        /// YAML serialization error.
        source: serde_yaml::Error,
    },
    /// Failed to encode interval rows.
    #[error("Failed to encode interval rows for {path}: {source}")]
    WriteCsv {
        /// Destination path.
        path: PathBuf,
        /// CSV encoding error.
        source: csv::Error,
    },
    /// Failed to remove or rename an existing file.
    #[error("Failed to remove {path}: {source}")]
    Remove {
        /// Path that could not be removed.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The per-user directory could not be resolved.
    #[error("Application directory unavailable: {0}")]
    AppDir(#[from] AppDirError),
}
