//! Where a participant's correction files are written and searched for.
//!
//! Writes go to the highest-priority root supplied: the project, then an
//! ad-hoc data directory, then the per-user directory. Reads walk every
//! supplied root in that order and then the per-user legacy locations; the
//! first file found wins.

use std::path::{Path, PathBuf};

use crate::app_dirs::{self, AppDirError};

const PROCESSED_DIR: &str = "processed";
const GLOBAL_EXPORTS_DIR: &str = "exports";

/// Explicit storage roots for one store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocations {
    project_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    global_dir: PathBuf,
}

impl StoreLocations {
    /// Locations rooted only at `global_dir` (the per-user fallback).
    pub fn new(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_path: None,
            data_dir: None,
            global_dir: global_dir.into(),
        }
    }

    /// Locations using the per-user `.rrational` directory as fallback.
    pub fn from_app_dirs() -> Result<Self, AppDirError> {
        Ok(Self::new(app_dirs::app_root_path()?))
    }

    pub fn with_project(mut self, project_path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(project_path.into());
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn project_path(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn global_dir(&self) -> &Path {
        &self.global_dir
    }

    /// Directory that receives every write.
    pub fn write_dir(&self) -> PathBuf {
        self.project_processed_dir()
            .or_else(|| self.data_processed_dir())
            .unwrap_or_else(|| self.global_dir.join(GLOBAL_EXPORTS_DIR))
    }

    /// Directories searched on read, highest priority first, without duplicates.
    pub fn read_dirs(&self) -> Vec<PathBuf> {
        let candidates = [
            self.project_processed_dir(),
            self.data_processed_dir(),
            Some(self.global_dir.join(GLOBAL_EXPORTS_DIR)),
            Some(self.global_dir.clone()),
        ];
        let mut dirs: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for dir in candidates.into_iter().flatten() {
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    pub fn write_path(&self, file_name: &str) -> PathBuf {
        self.write_dir().join(file_name)
    }

    pub fn read_paths(&self, file_name: &str) -> Vec<PathBuf> {
        self.read_dirs()
            .into_iter()
            .map(|dir| dir.join(file_name))
            .collect()
    }

    /// `<project>/processed`, used by older releases for participant events.
    pub(crate) fn legacy_project_dir(&self) -> Option<PathBuf> {
        self.project_path
            .as_ref()
            .map(|project| project.join(PROCESSED_DIR))
    }

    fn project_processed_dir(&self) -> Option<PathBuf> {
        self.project_path
            .as_ref()
            .map(|project| project.join("data").join(PROCESSED_DIR))
    }

    fn data_processed_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_ref().map(|data_dir| {
            data_dir
                .parent()
                .unwrap_or(data_dir)
                .join(PROCESSED_DIR)
        })
    }
}

/// Filename-safe form of a participant id.
pub(crate) fn file_stem(participant_id: &str) -> String {
    participant_id
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' => '_',
            other => other,
        })
        .collect()
}
