//! Non-fatal results reported by the correction store.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::warn;

/// A condition that was tolerated instead of failing the operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreWarning {
    pub path: PathBuf,
    pub message: String,
}

impl StoreWarning {
    /// Build a warning and emit it to the log.
    pub fn new(path: &Path, message: impl Into<String>) -> Self {
        let warning = Self {
            path: path.to_path_buf(),
            message: message.into(),
        };
        warn!(path = %warning.path.display(), "{}", warning.message);
        warning
    }
}

impl fmt::Display for StoreWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Result of a fail-open read: an optional value plus anything skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub value: Option<T>,
    pub warnings: Vec<StoreWarning>,
}

impl<T> Loaded<T> {
    pub fn found(value: T, warnings: Vec<StoreWarning>) -> Self {
        Self {
            value: Some(value),
            warnings,
        }
    }

    pub fn missing(warnings: Vec<StoreWarning>) -> Self {
        Self {
            value: None,
            warnings,
        }
    }

    /// Drop the warnings and keep the value.
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// True when nothing was skipped while reading.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        Loaded {
            value: self.value.map(f),
            warnings: self.warnings,
        }
    }

    pub fn and_then<U>(self, f: impl FnOnce(T) -> Option<U>) -> Loaded<U> {
        Loaded {
            value: self.value.and_then(f),
            warnings: self.warnings,
        }
    }
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self::missing(Vec::new())
    }
}

/// What happened to one file during a best-effort migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    Copied,
    Skipped { reason: String },
    Failed { reason: String },
}

/// Per-file outcomes of a best-effort migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub entries: Vec<(PathBuf, MigrationOutcome)>,
}

impl MigrationReport {
    pub fn copied(&self) -> usize {
        self.count(|outcome| matches!(outcome, MigrationOutcome::Copied))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, MigrationOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&MigrationOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}
