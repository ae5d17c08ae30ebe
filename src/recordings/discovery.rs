//! Directory scan that pairs beat files with event files per participant.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{IdentityPattern, RecordingBundle};

/// Default case-insensitive filename marker for beat files.
pub const DEFAULT_BEAT_FILE_MARKER: &str = "RR";
/// Default case-insensitive filename marker for event files.
pub const DEFAULT_EVENT_FILE_MARKER: &str = "Events";

/// How discovery recognizes files and participants.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub pattern: IdentityPattern,
    pub beat_file_marker: String,
    pub event_file_marker: String,
}

impl DiscoveryOptions {
    /// Default filename markers with a custom identity pattern.
    pub fn with_pattern(pattern: IdentityPattern) -> Self {
        Self {
            pattern,
            ..Self::default()
        }
    }
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            pattern: IdentityPattern::default(),
            beat_file_marker: DEFAULT_BEAT_FILE_MARKER.to_string(),
            event_file_marker: DEFAULT_EVENT_FILE_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileRole {
    Beats,
    Events,
}

/// Find beat/event file pairs under `root`, sorted by participant id.
///
/// A missing or unreadable root yields an empty list (logged as a warning).
/// Participants without a beat file are not reported.
pub fn discover_recordings(root: &Path, options: &DiscoveryOptions) -> Vec<RecordingBundle> {
    let mut beat_index: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    let mut event_index: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    let mut files = collect_csv_files(root);
    files.sort();
    for path in files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let roles = classify(&name, options);
        if roles.is_empty() {
            continue;
        }
        let participant = options.pattern.resolve(&name);
        for role in roles {
            let index = match role {
                FileRole::Beats => &mut beat_index,
                FileRole::Events => &mut event_index,
            };
            index
                .entry(participant.clone())
                .or_default()
                .push(path.clone());
        }
    }

    for (participant, paths) in &event_index {
        if !beat_index.contains_key(participant) {
            debug!(
                participant = %participant,
                files = paths.len(),
                "Event files without a beat file are ignored"
            );
        }
    }

    beat_index
        .into_iter()
        .filter_map(|(participant_id, beat_files)| {
            let beat_file_path = beat_files.into_iter().next()?;
            let event_file_path = event_index
                .get(&participant_id)
                .and_then(|paths| paths.first().cloned());
            Some(RecordingBundle {
                participant_id,
                beat_file_path,
                event_file_path,
            })
        })
        .collect()
}

/// Roles of a file; a name carrying both markers counts as both.
fn classify(file_name: &str, options: &DiscoveryOptions) -> Vec<FileRole> {
    let lowered = file_name.to_lowercase();
    if !lowered.ends_with(".csv") {
        return Vec::new();
    }
    [
        (FileRole::Beats, &options.beat_file_marker),
        (FileRole::Events, &options.event_file_marker),
    ]
    .into_iter()
    .filter(|(_, marker)| lowered.contains(&marker.to_lowercase()))
    .map(|(role, _)| role)
    .collect()
}

fn collect_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    if !root.is_dir() {
        warn!(root = %root.display(), "Recording root is not a directory; nothing discovered");
        return found;
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(
                    dir = %dir.display(),
                    error = %err,
                    "Failed to read directory during discovery"
                );
                continue;
            }
        };
        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(
                        dir = %dir.display(),
                        error = %err,
                        "Failed to read directory entry during discovery"
                    );
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "Failed to read file type during discovery"
                    );
                    continue;
                }
            };
            if file_type.is_dir() {
                stack.push(path);
            } else if file_type.is_file() || (file_type.is_symlink() && path.is_file()) {
                found.push(path);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "date,rr\n").unwrap();
    }

    fn p_pattern() -> DiscoveryOptions {
        DiscoveryOptions::with_pattern(IdentityPattern::new(r"(?P<participant>P\d+)").unwrap())
    }

    #[test]
    fn pairs_beat_and_event_files() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("P07_RR.csv"));
        touch(&dir.path().join("nested").join("P07_Events.csv"));

        let bundles = discover_recordings(dir.path(), &p_pattern());
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].participant_id, "P07");
        assert_eq!(bundles[0].beat_file_path, dir.path().join("P07_RR.csv"));
        assert_eq!(
            bundles[0].event_file_path,
            Some(dir.path().join("nested").join("P07_Events.csv"))
        );
    }

    #[test]
    fn beat_file_alone_yields_bundle_without_events() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("P07_RR.csv"));
        let bundles = discover_recordings(dir.path(), &p_pattern());
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].event_file_path, None);
    }

    #[test]
    fn event_file_alone_yields_nothing() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("P07_Events.csv"));
        assert!(discover_recordings(dir.path(), &p_pattern()).is_empty());
    }

    #[test]
    fn markers_and_extension_are_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("P01_rr.CSV"));
        touch(&dir.path().join("P01_EVENTS.csv"));
        touch(&dir.path().join("P01_RR.txt"));
        let bundles = discover_recordings(dir.path(), &p_pattern());
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].beat_file_path, dir.path().join("P01_rr.CSV"));
        assert_eq!(
            bundles[0].event_file_path,
            Some(dir.path().join("P01_EVENTS.csv"))
        );
    }

    #[test]
    fn custom_markers_are_honored() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("P03_beats.csv"));
        touch(&dir.path().join("P03_marks.csv"));
        touch(&dir.path().join("P03_RR.csv"));
        let options = DiscoveryOptions {
            beat_file_marker: "beats".into(),
            event_file_marker: "marks".into(),
            ..p_pattern()
        };
        let bundles = discover_recordings(dir.path(), &options);
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].beat_file_path, dir.path().join("P03_beats.csv"));
        assert_eq!(
            bundles[0].event_file_path,
            Some(dir.path().join("P03_marks.csv"))
        );
    }

    #[test]
    fn first_path_in_lexical_order_wins_and_output_is_sorted() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("b").join("P02_RR.csv"));
        touch(&dir.path().join("a").join("P02_RR.csv"));
        touch(&dir.path().join("P01_RR.csv"));
        touch(&dir.path().join("z").join("P02_Events.csv"));
        touch(&dir.path().join("y").join("P02_Events.csv"));

        let bundles = discover_recordings(dir.path(), &p_pattern());
        let ids: Vec<_> = bundles.iter().map(|b| b.participant_id.as_str()).collect();
        assert_eq!(ids, ["P01", "P02"]);
        assert_eq!(bundles[1].beat_file_path, dir.path().join("a").join("P02_RR.csv"));
        assert_eq!(
            bundles[1].event_file_path,
            Some(dir.path().join("y").join("P02_Events.csv"))
        );
    }

    #[test]
    fn missing_root_yields_empty_result() {
        let dir = tempdir().unwrap();
        let bundles = discover_recordings(&dir.path().join("absent"), &DiscoveryOptions::default());
        assert!(bundles.is_empty());
    }
}
