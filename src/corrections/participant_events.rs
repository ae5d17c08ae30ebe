//! Reviewer edits to a participant's event list: `<participant>_events.yml`.
//!
//! Older releases wrote project data to `<project>/processed` and, without a
//! project, kept every participant in one `participant_events.yml` mapping in
//! the per-user directory. Both are still read and cleaned up on delete.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::document::{self, Candidate};
use super::locations::file_stem;
use super::validations::participants_in;
use super::{
    CorrectionError, FormatVersion, Loaded, SOURCE_TYPE, StoreLocations, StoreWarning,
    null_as_default,
};

const FILE_SUFFIX: &str = "_events.yml";
const AGGREGATE_FILE_NAME: &str = "participant_events.yml";
const CURRENT_VERSION: FormatVersion = FormatVersion::new(1, 0);

fn default_true() -> bool {
    true
}

fn current_version() -> FormatVersion {
    CURRENT_VERSION
}

fn default_source_type() -> String {
    SOURCE_TYPE.to_string()
}

/// One event as confirmed by the reviewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    #[serde(default)]
    pub raw_label: String,
    #[serde(default)]
    pub canonical: Option<String>,
    #[serde(default)]
    pub first_timestamp: Option<String>,
    #[serde(default)]
    pub last_timestamp: Option<String>,
}

/// A time range left out of analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionZone {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_true")]
    pub exclude_from_duration: bool,
}

/// The editable event lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventEdits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<EventRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manual: Vec<EventRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub music_events: Vec<EventRecord>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub exclusion_zones: Vec<ExclusionZone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EventsFile {
    #[serde(default)]
    participant_id: Option<String>,
    #[serde(skip_deserializing, default = "current_version")]
    format_version: FormatVersion,
    #[serde(default = "default_source_type")]
    source_type: String,
    #[serde(flatten)]
    edits: EventEdits,
}

/// Edits found for a participant and where they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedEvents {
    pub participant_id: String,
    pub edits: EventEdits,
    pub source_path: PathBuf,
}

pub fn file_name(participant_id: &str) -> String {
    format!("{}{FILE_SUFFIX}", file_stem(participant_id))
}

/// Per-participant file locations, highest priority first.
fn candidate_dirs(locations: &StoreLocations) -> Vec<PathBuf> {
    let mut dirs = locations.read_dirs();
    if let Some(legacy) = locations.legacy_project_dir()
        && !dirs.contains(&legacy)
    {
        dirs.insert(1, legacy);
    }
    dirs
}

fn aggregate_path(locations: &StoreLocations) -> PathBuf {
    locations.global_dir().join(AGGREGATE_FILE_NAME)
}

/// Replace the participant's event edits.
pub fn save(
    locations: &StoreLocations,
    participant_id: &str,
    edits: EventEdits,
) -> Result<PathBuf, CorrectionError> {
    let path = locations.write_path(&file_name(participant_id));
    let record = EventsFile {
        participant_id: Some(participant_id.to_string()),
        format_version: CURRENT_VERSION,
        source_type: default_source_type(),
        edits,
    };
    document::write_document(&path, &record)?;
    info!(
        participant = participant_id,
        path = %path.display(),
        "Saved participant events"
    );
    Ok(path)
}

/// First per-participant file in the read chain, else the aggregate entry.
pub fn load(locations: &StoreLocations, participant_id: &str) -> Loaded<SavedEvents> {
    let paths = candidate_dirs(locations)
        .into_iter()
        .map(|dir| dir.join(file_name(participant_id)));
    let Loaded {
        value,
        mut warnings,
    } = document::first_document(paths, |_path, value| {
        serde_yaml::from_value::<EventsFile>(value)
    });
    if let Some((source_path, file)) = value {
        return Loaded::found(
            SavedEvents {
                participant_id: file
                    .participant_id
                    .unwrap_or_else(|| participant_id.to_string()),
                edits: file.edits,
                source_path,
            },
            warnings,
        );
    }

    let aggregate = aggregate_path(locations);
    let entry = match document::read_document(&aggregate) {
        Candidate::Found(value) => value.get(participant_id).cloned(),
        Candidate::Missing => None,
        Candidate::Invalid(warning) => {
            warnings.push(warning);
            None
        }
    };
    let Some(entry) = entry else {
        return Loaded::missing(warnings);
    };
    match serde_yaml::from_value::<EventEdits>(entry) {
        Ok(edits) => Loaded::found(
            SavedEvents {
                participant_id: participant_id.to_string(),
                edits,
                source_path: aggregate,
            },
            warnings,
        ),
        Err(err) => {
            warnings.push(StoreWarning::new(
                &aggregate,
                format!("corrupt entry for {participant_id}: {err}"),
            ));
            Loaded::missing(warnings)
        }
    }
}

/// Remove the participant's edits from every location, including the
/// aggregate file. Reports whether anything was removed.
pub fn delete(locations: &StoreLocations, participant_id: &str) -> Result<bool, CorrectionError> {
    let mut removed = false;
    for dir in candidate_dirs(locations) {
        removed |= document::remove_if_exists(&dir.join(file_name(participant_id)))?;
    }

    let aggregate = aggregate_path(locations);
    if let Candidate::Found(mut value) = document::read_document(&aggregate)
        && let Some(mapping) = value.as_mapping_mut()
        && mapping.remove(participant_id).is_some()
    {
        document::write_document(&aggregate, &value)?;
        info!(
            participant = participant_id,
            path = %aggregate.display(),
            "Removed participant from aggregate events file"
        );
        removed = true;
    }
    Ok(removed)
}

/// Participants with saved edits in any location, sorted.
pub fn list_participants(locations: &StoreLocations) -> Vec<String> {
    let mut participants = BTreeSet::new();
    for dir in candidate_dirs(locations) {
        participants.extend(
            participants_in(&dir, FILE_SUFFIX)
                .into_iter()
                // the aggregate file shares the suffix
                .filter(|id| format!("{id}{FILE_SUFFIX}") != AGGREGATE_FILE_NAME),
        );
    }
    if let Candidate::Found(value) = document::read_document(&aggregate_path(locations)) {
        let keys: BTreeMap<String, serde_yaml::Value> =
            serde_yaml::from_value(value).unwrap_or_default();
        participants.extend(keys.into_keys());
    }
    participants.into_iter().collect()
}
