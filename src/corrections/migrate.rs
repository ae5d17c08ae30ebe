//! One-time copy of data left in the pre-rename application directory.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::{MigrationOutcome, MigrationReport};

/// Copy every top-level `.yml` file from `legacy` into `current`.
///
/// A file is copied when the target is missing or smaller than the legacy
/// copy, which means the target only holds defaults. Failures are recorded
/// per file and never abort the run.
pub fn migrate_legacy_dir(legacy: &Path, current: &Path) -> MigrationReport {
    let mut report = MigrationReport::default();
    let entries = match fs::read_dir(legacy) {
        Ok(entries) => entries,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %legacy.display(), error = %err, "Legacy directory unreadable");
            }
            return report;
        }
    };

    let mut files: Vec<_> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "yml"))
        .collect();
    files.sort();

    for source in files {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = current.join(name);
        let outcome = migrate_file(&source, &target);
        match &outcome {
            MigrationOutcome::Copied => {
                info!(from = %source.display(), to = %target.display(), "Migrated legacy file")
            }
            MigrationOutcome::Failed { reason } => {
                warn!(from = %source.display(), reason = %reason, "Legacy file not migrated")
            }
            MigrationOutcome::Skipped { .. } => {}
        }
        report.entries.push((target, outcome));
    }
    report
}

fn migrate_file(source: &Path, target: &Path) -> MigrationOutcome {
    let source_len = match fs::metadata(source) {
        Ok(meta) => meta.len(),
        Err(err) => return MigrationOutcome::Failed { reason: err.to_string() },
    };
    match fs::metadata(target) {
        Ok(meta) if meta.len() >= source_len => {
            return MigrationOutcome::Skipped {
                reason: "target already holds at least as much data".to_string(),
            };
        }
        Ok(_) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return MigrationOutcome::Failed { reason: err.to_string() },
    }
    if let Some(parent) = target.parent()
        && let Err(err) = fs::create_dir_all(parent)
    {
        return MigrationOutcome::Failed { reason: err.to_string() };
    }
    match fs::copy(source, target) {
        Ok(_) => MigrationOutcome::Copied,
        Err(err) => MigrationOutcome::Failed { reason: err.to_string() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copies_missing_and_larger_files_only() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join(".music_hrv");
        let current = dir.path().join(".rrational");
        fs::create_dir_all(&legacy).unwrap();
        fs::create_dir_all(&current).unwrap();
        fs::write(legacy.join("groups.yml"), "groups: {a: 1, b: 2}").unwrap();
        fs::write(legacy.join("events.yml"), "x").unwrap();
        fs::write(legacy.join("notes.txt"), "ignored").unwrap();
        fs::write(current.join("groups.yml"), "{}").unwrap();
        fs::write(current.join("events.yml"), "events: {}").unwrap();

        let report = migrate_legacy_dir(&legacy, &current);
        assert_eq!(report.entries.len(), 2);
        assert_eq!(report.copied(), 1);
        assert_eq!(report.failed(), 0);
        assert_eq!(
            fs::read_to_string(current.join("groups.yml")).unwrap(),
            "groups: {a: 1, b: 2}"
        );
        assert_eq!(fs::read_to_string(current.join("events.yml")).unwrap(), "events: {}");
        assert!(!current.join("notes.txt").exists());
    }

    #[test]
    fn creates_target_directory() {
        let dir = tempdir().unwrap();
        let legacy = dir.path().join("old");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("settings.yml"), "a: 1").unwrap();
        let current = dir.path().join("new");
        let report = migrate_legacy_dir(&legacy, &current);
        assert_eq!(report.entries, vec![(current.join("settings.yml"), MigrationOutcome::Copied)]);
    }

    #[test]
    fn missing_legacy_dir_yields_empty_report() {
        let dir = tempdir().unwrap();
        let report = migrate_legacy_dir(&dir.path().join("absent"), dir.path());
        assert!(report.entries.is_empty());
    }
}
