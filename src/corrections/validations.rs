//! Reviewer-chosen section boundaries: `<participant>_section_validations.yml`.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::document;
use super::locations::file_stem;
use super::{
    CorrectionError, FormatVersion, Loaded, StoreLocations, now_rfc3339, null_as_default,
};

const FILE_SUFFIX: &str = "_section_validations.yml";
const CURRENT_VERSION: FormatVersion = FormatVersion::new(1, 0);

/// The candidate event chosen for one end of a section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChosenEvent {
    #[serde(default)]
    pub canonical: String,
    #[serde(default)]
    pub raw_label: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Position of the chosen occurrence among duplicates.
    #[serde(default)]
    pub index: usize,
}

/// Frozen boundary decision for one named section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionValidation {
    #[serde(default)]
    pub is_valid: bool,
    #[serde(default)]
    pub start_event: Option<ChosenEvent>,
    #[serde(default)]
    pub end_event: Option<ChosenEvent>,
    #[serde(default)]
    pub manually_selected: bool,
    #[serde(default)]
    pub missing_start: bool,
    #[serde(default)]
    pub missing_end: bool,
    #[serde(default)]
    pub needs_disambiguation: bool,
    #[serde(default)]
    pub start_candidates_count: usize,
    #[serde(default)]
    pub end_candidates_count: usize,
    #[serde(default)]
    pub duration_s: Option<f64>,
    #[serde(default)]
    pub beat_count: Option<usize>,
}

/// Stored validations for one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionValidations {
    #[serde(default)]
    pub participant_id: String,
    #[serde(default)]
    pub group: String,
    #[serde(skip_deserializing, default = "current_version")]
    pub format_version: FormatVersion,
    #[serde(default)]
    pub saved_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: BTreeMap<String, SectionValidation>,
}

fn current_version() -> FormatVersion {
    CURRENT_VERSION
}

pub fn file_name(participant_id: &str) -> String {
    format!("{}{FILE_SUFFIX}", file_stem(participant_id))
}

/// Replace the participant's validations with `sections`.
pub fn save(
    locations: &StoreLocations,
    participant_id: &str,
    group: &str,
    sections: BTreeMap<String, SectionValidation>,
) -> Result<PathBuf, CorrectionError> {
    let path = locations.write_path(&file_name(participant_id));
    let record = SectionValidations {
        participant_id: participant_id.to_string(),
        group: group.to_string(),
        format_version: CURRENT_VERSION,
        saved_at: Some(now_rfc3339()),
        sections,
    };
    document::write_document(&path, &record)?;
    info!(
        participant = participant_id,
        sections = record.sections.len(),
        path = %path.display(),
        "Saved section validations"
    );
    Ok(path)
}

pub fn load(locations: &StoreLocations, participant_id: &str) -> Loaded<SectionValidations> {
    document::first_document(
        locations.read_paths(&file_name(participant_id)),
        |_path, value| {
            let mut record: SectionValidations = serde_yaml::from_value(value)?;
            if record.participant_id.is_empty() {
                record.participant_id = participant_id.to_string();
            }
            Ok(record)
        },
    )
    .map(|(_, record)| record)
}

/// Remove the participant's validations from every read location.
pub fn delete(locations: &StoreLocations, participant_id: &str) -> Result<bool, CorrectionError> {
    let mut removed = false;
    for path in locations.read_paths(&file_name(participant_id)) {
        removed |= document::remove_if_exists(&path)?;
    }
    Ok(removed)
}

/// Participants with saved validations in the write directory or the
/// per-user directory, sorted and without duplicates.
pub fn list_participants(locations: &StoreLocations) -> Vec<String> {
    let mut participants = BTreeSet::new();
    for dir in [locations.write_dir(), locations.global_dir().to_path_buf()] {
        participants.extend(participants_in(&dir, FILE_SUFFIX));
    }
    participants.into_iter().collect()
}

/// Participant ids of files named `<id><suffix>` directly inside `dir`.
pub(super) fn participants_in(dir: &Path, suffix: &str) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(err) => {
            warn!(dir = %dir.display(), error = %err, "Failed to list correction files");
            return Vec::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.strip_suffix(suffix)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        })
        .collect()
}
