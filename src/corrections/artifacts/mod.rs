//! Artifact corrections: `<participant>_artifacts.yml`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::document::{self, Candidate};
use super::locations::file_stem;
use super::{
    CorrectionError, FormatVersion, Loaded, SectionKey, StoreLocations, StoreWarning,
    now_rfc3339,
};

mod format;


pub use format::{
    ArtifactRecord, ArtifactSection, ArtifactsV1_0, ArtifactsV1_1, ArtifactsV1_2, ArtifactsV1_3,
    DetectionScope, ManualArtifact, v1_0_to_v1_1, v1_1_to_v1_2, v1_2_to_v1_3,
};

/// Every saved section for one participant, upgraded to the current layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactCorrections {
    pub participant_id: String,
    /// Version declared by the file that was read.
    pub stored_version: FormatVersion,
    /// False when the file predates per-section storage.
    pub sectioned: bool,
    pub sections: BTreeMap<SectionKey, ArtifactSection>,
    pub last_modified: Option<String>,
    pub source_path: PathBuf,
}

/// Per-section counts shown next to merged markings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionSummary {
    pub algorithm_count: usize,
    pub manual_count: usize,
    pub excluded_count: usize,
    pub method: Option<String>,
    pub scope: Option<DetectionScope>,
    pub saved_at: Option<String>,
}

/// All sections flattened for display; never written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedArtifacts {
    pub algorithm_artifact_indices: Vec<usize>,
    pub manual_artifacts: Vec<ManualArtifact>,
    pub excluded_artifact_indices: Vec<usize>,
    pub sections: BTreeMap<SectionKey, SectionSummary>,
}

/// Markings recovered from an exported analysis document.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifacts {
    pub manual_artifacts: Vec<ManualArtifact>,
    pub excluded_artifact_indices: Vec<usize>,
    pub source_file: PathBuf,
}

pub fn file_name(participant_id: &str) -> String {
    format!("{}_artifacts.yml", file_stem(participant_id))
}

/// Save `section` under `section_key` and return the written path.
///
/// An older file at the write location is upgraded first. Saving `_full`
/// drops every named section; saving a named section drops `_full`.
pub fn save(
    locations: &StoreLocations,
    participant_id: &str,
    section_key: &SectionKey,
    mut section: ArtifactSection,
) -> Result<PathBuf, CorrectionError> {
    let path = locations.write_path(&file_name(participant_id));
    let mut record = document::load_for_update(&path, format::decode_file)?
        .map(|decoded| decoded.record.upgrade())
        .unwrap_or_default();

    let now = now_rfc3339();
    section.saved_at = Some(now.clone());
    record.upsert(section_key.clone(), section);
    record.participant_id = Some(participant_id.to_string());
    record.format_version = format::CURRENT_VERSION;
    record.source_type = super::SOURCE_TYPE.to_string();
    record.last_modified = Some(now);

    document::write_document(&path, &record)?;
    info!(
        participant = participant_id,
        section = %section_key,
        path = %path.display(),
        "Saved artifact corrections"
    );
    Ok(path)
}

/// Load every section from the first artifact file in the read chain.
pub fn load(locations: &StoreLocations, participant_id: &str) -> Loaded<ArtifactCorrections> {
    document::first_document(
        locations.read_paths(&file_name(participant_id)),
        format::decode_file,
    )
    .map(|(source_path, decoded)| {
        let sectioned = decoded.record.is_sectioned();
        let record = decoded.record.upgrade();
        ArtifactCorrections {
            participant_id: record
                .participant_id
                .unwrap_or_else(|| participant_id.to_string()),
            stored_version: decoded.stored_version,
            sectioned,
            sections: record.sections,
            last_modified: record.last_modified,
            source_path,
        }
    })
}

/// Load one section; legacy files only hold `_full`.
pub fn load_section(
    locations: &StoreLocations,
    participant_id: &str,
    section_key: &SectionKey,
) -> Loaded<ArtifactSection> {
    load(locations, participant_id)
        .and_then(|mut corrections| corrections.sections.remove(section_key))
}

/// Keys of every saved section, empty when nothing is saved.
pub fn list_sections(locations: &StoreLocations, participant_id: &str) -> Loaded<Vec<SectionKey>> {
    let loaded = load(locations, participant_id);
    let keys = loaded
        .value
        .map(|corrections| corrections.sections.into_keys().collect())
        .unwrap_or_default();
    Loaded::found(keys, loaded.warnings)
}

/// Concatenate every section's markings for display.
pub fn merged_for_display(
    locations: &StoreLocations,
    participant_id: &str,
) -> Loaded<MergedArtifacts> {
    let loaded = load(locations, participant_id);
    let mut merged = MergedArtifacts::default();
    for (key, section) in loaded
        .value
        .map(|corrections| corrections.sections)
        .unwrap_or_default()
    {
        merged.sections.insert(
            key,
            SectionSummary {
                algorithm_count: section.algorithm_artifact_indices.len(),
                manual_count: section.manual_artifacts.len(),
                excluded_count: section.excluded_artifact_indices.len(),
                method: section.algorithm_method,
                scope: section.scope,
                saved_at: section.saved_at,
            },
        );
        merged
            .algorithm_artifact_indices
            .extend(section.algorithm_artifact_indices);
        merged.manual_artifacts.extend(section.manual_artifacts);
        merged
            .excluded_artifact_indices
            .extend(section.excluded_artifact_indices);
    }
    Loaded::found(merged, loaded.warnings)
}

/// Remove the participant's artifact file from every read location.
pub fn delete(locations: &StoreLocations, participant_id: &str) -> Result<bool, CorrectionError> {
    let mut removed = false;
    for path in locations.read_paths(&file_name(participant_id)) {
        removed |= document::remove_if_exists(&path)?;
    }
    Ok(removed)
}

#[derive(Debug, Default, Deserialize)]
struct ExportDocument {
    #[serde(default)]
    processing: ExportProcessing,
}

#[derive(Debug, Default, Deserialize)]
struct ExportProcessing {
    #[serde(default, deserialize_with = "super::null_as_default")]
    manual_artifacts: Vec<ManualArtifact>,
    #[serde(default, deserialize_with = "super::null_as_default")]
    excluded_detected_indices: Vec<usize>,
}

/// Recover markings from an exported analysis document.
///
/// Yields nothing when the file is absent, unreadable or carries no markings.
pub fn load_from_export(path: &Path) -> Loaded<ExportedArtifacts> {
    let document = match document::read_document(path) {
        Candidate::Missing => return Loaded::default(),
        Candidate::Invalid(warning) => return Loaded::missing(vec![warning]),
        Candidate::Found(document) => document,
    };
    let export: ExportDocument = match serde_yaml::from_value(document) {
        Ok(export) => export,
        Err(err) => {
            return Loaded::missing(vec![StoreWarning::new(
                path,
                format!("unexpected export layout: {err}"),
            )]);
        }
    };
    let ExportProcessing {
        mut manual_artifacts,
        excluded_detected_indices,
    } = export.processing;
    if manual_artifacts.is_empty() && excluded_detected_indices.is_empty() {
        return Loaded::default();
    }
    for artifact in &mut manual_artifacts {
        artifact.plot_idx = Some(artifact.original_idx);
    }
    Loaded::found(
        ExportedArtifacts {
            manual_artifacts,
            excluded_artifact_indices: excluded_detected_indices,
            source_file: path.to_path_buf(),
        },
        Vec::new(),
    )
}
