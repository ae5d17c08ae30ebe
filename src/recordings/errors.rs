use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while discovering or loading recordings.
///
/// Malformed rows never reach this type; they are skipped during parsing.
#[derive(Debug, Error)]
pub enum RecordingError {
    /// A recording file exists but could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The mandatory beat file of a bundle is gone.
    #[error("Beat file not found: {0}")]
    MissingBeatFile(PathBuf),
    /// The participant identity pattern failed to compile.
    #[error("Invalid participant pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// Pattern text as supplied.
        pattern: String,
        /// Regex compile error.
        source: regex::Error,
    },
}
