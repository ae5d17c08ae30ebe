//! YAML document plumbing shared by every correction category.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_yaml::Value;
use tracing::{info, warn};

use crate::atomic_file;

use super::{CorrectionError, Loaded, StoreWarning};

/// State of one candidate file.
pub(super) enum Candidate {
    Missing,
    Found(Value),
    Invalid(StoreWarning),
}

/// Read `path` as YAML. An empty file reads as an empty mapping.
pub(super) fn read_document(path: &Path) -> Candidate {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Candidate::Missing,
        Err(err) => return Candidate::Invalid(StoreWarning::new(path, format!("unreadable: {err}"))),
    };
    match serde_yaml::from_str::<Value>(&text) {
        Ok(Value::Null) => Candidate::Found(Value::Mapping(Default::default())),
        Ok(value @ Value::Mapping(_)) => Candidate::Found(value),
        Ok(_) => Candidate::Invalid(StoreWarning::new(path, "not a key-value document")),
        Err(err) => Candidate::Invalid(StoreWarning::new(path, format!("corrupt: {err}"))),
    }
}

/// Walk `paths` in order and decode the first usable document.
///
/// Unreadable or undecodable files are reported and skipped.
pub(super) fn first_document<T>(
    paths: impl IntoIterator<Item = PathBuf>,
    decode: impl Fn(&Path, Value) -> Result<T, serde_yaml::Error>,
) -> Loaded<(PathBuf, T)> {
    let mut warnings = Vec::new();
    for path in paths {
        match read_document(&path) {
            Candidate::Missing => continue,
            Candidate::Invalid(warning) => warnings.push(warning),
            Candidate::Found(value) => match decode(&path, value) {
                Ok(decoded) => return Loaded::found((path, decoded), warnings),
                Err(err) => warnings.push(StoreWarning::new(&path, format!("corrupt: {err}"))),
            },
        }
    }
    Loaded::missing(warnings)
}

/// Load the record about to be rewritten at `path`.
///
/// A corrupt file is moved aside to `<name>.corrupt.bak` so the fresh record
/// does not silently discard it.
pub(super) fn load_for_update<T>(
    path: &Path,
    decode: impl Fn(&Path, Value) -> Result<T, serde_yaml::Error>,
) -> Result<Option<T>, CorrectionError> {
    let decoded = match read_document(path) {
        Candidate::Missing => return Ok(None),
        Candidate::Found(value) => decode(path, value).map_err(|err| err.to_string()),
        Candidate::Invalid(warning) => Err(warning.message),
    };
    match decoded {
        Ok(record) => Ok(Some(record)),
        Err(reason) => {
            let backup = backup_corrupt(path)?;
            warn!(
                path = %path.display(),
                backup = %backup.display(),
                reason = %reason,
                "Replacing unreadable record; previous contents kept as backup"
            );
            Ok(None)
        }
    }
}

/// Serialize `record` and replace `path` atomically.
pub(super) fn write_document<T: Serialize>(path: &Path, record: &T) -> Result<(), CorrectionError> {
    let text = serde_yaml::to_string(record).map_err(|source| CorrectionError::SerializeYaml {
        path: path.to_path_buf(),
        source,
    })?;
    write_bytes(path, text.as_bytes())
}

/// Replace `path` atomically with `data`, creating its directory.
pub(super) fn write_bytes(path: &Path, data: &[u8]) -> Result<(), CorrectionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CorrectionError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    atomic_file::write(path, data).map_err(|source| CorrectionError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Delete `path` if present; reports whether anything was removed.
pub(super) fn remove_if_exists(path: &Path) -> Result<bool, CorrectionError> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "Removed correction file");
            Ok(true)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CorrectionError::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn backup_corrupt(path: &Path) -> Result<PathBuf, CorrectionError> {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt.bak");
    let backup = path.with_file_name(name);
    std::fs::rename(path, &backup).map_err(|source| CorrectionError::Remove {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(backup)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn as_mapping_len(_: &Path, value: Value) -> Result<usize, serde_yaml::Error> {
        Ok(value.as_mapping().map(|m| m.len()).unwrap_or(0))
    }

    #[test]
    fn first_document_skips_corrupt_candidates_with_warning() {
        let dir = tempdir().unwrap();
        let bad = dir.path().join("a.yml");
        let good = dir.path().join("b.yml");
        std::fs::write(&bad, "key: [unclosed").unwrap();
        std::fs::write(&good, "one: 1\ntwo: 2\n").unwrap();

        let loaded = first_document(
            [dir.path().join("missing.yml"), bad.clone(), good.clone()],
            as_mapping_len,
        );
        assert_eq!(loaded.value, Some((good, 2)));
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].path, bad);
    }

    #[test]
    fn empty_file_reads_as_empty_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.yml");
        std::fs::write(&path, "").unwrap();
        let loaded = first_document([path], as_mapping_len);
        assert_eq!(loaded.value.map(|(_, len)| len), Some(0));
    }

    #[test]
    fn load_for_update_backs_up_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("P01_artifacts.yml");
        std::fs::write(&path, "- just\n- a list\n").unwrap();

        let loaded = load_for_update(&path, as_mapping_len).unwrap();
        assert_eq!(loaded, None);
        assert!(!path.exists());
        assert!(dir.path().join("P01_artifacts.yml.corrupt.bak").exists());
    }

    #[test]
    fn remove_if_exists_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.yml");
        std::fs::write(&path, "a: 1").unwrap();
        assert!(remove_if_exists(&path).unwrap());
        assert!(!remove_if_exists(&path).unwrap());
    }
}
