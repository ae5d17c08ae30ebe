//! Corrected NN-interval series.
//!
//! Per participant, `<participant>_nn_metadata.yml` holds correction details
//! for every section and `<participant>_<section>_nn.csv` holds each
//! section's rows. Files from the older single-YAML layout are read
//! transparently and converted on the next save.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use tracing::info;

use super::document::{self, Candidate};
use super::locations::file_stem;
use super::{CorrectionError, FormatVersion, Loaded, StoreLocations, StoreWarning, now_rfc3339};

mod csv_file;
mod format;

#[cfg(test)]
mod tests;

pub use format::{
    LegacyNnSection, LegacyRow, NnIntervalsV1_0, NnMetadataV2_0, NnRecord, NnSectionMetadata,
    UpgradedNn, v1_0_to_v2_0,
};

/// One corrected interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NnInterval {
    /// Offset from the section start.
    pub elapsed_ms: i64,
    pub interval_ms: f64,
    pub was_interpolated: bool,
}

/// Original and replacement value of one interpolated interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalCorrection {
    pub nn_idx: usize,
    pub original_rr_ms: f64,
    pub corrected_nn_ms: f64,
}

/// A section's metadata joined with its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NnSection {
    pub metadata: NnSectionMetadata,
    pub intervals: Vec<NnInterval>,
}

/// Every saved section for one participant.
#[derive(Debug, Clone, PartialEq)]
pub struct NnIntervalSeries {
    pub participant_id: String,
    pub stored_version: FormatVersion,
    pub created_at: Option<String>,
    pub last_modified: Option<String>,
    pub sections: BTreeMap<String, NnSection>,
    pub source_path: PathBuf,
}

/// Status line for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NnSummary {
    pub nn_count: usize,
    pub correction_method: String,
    pub corrected_at: Option<String>,
    pub intervals_corrected: usize,
}

pub fn metadata_file_name(participant_id: &str) -> String {
    format!("{}{}", file_stem(participant_id), format::METADATA_SUFFIX)
}

pub fn legacy_file_name(participant_id: &str) -> String {
    format!("{}{}", file_stem(participant_id), format::LEGACY_SUFFIX)
}

pub fn csv_file_name(participant_id: &str, section: &str) -> String {
    format!("{}_{}_nn.csv", file_stem(participant_id), file_stem(section))
}

/// Save one section's rows and metadata; returns the CSV path.
///
/// Other sections' metadata is kept. An older single-file record in the
/// write directory is split into the current layout first.
pub fn save_section(
    locations: &StoreLocations,
    participant_id: &str,
    section_name: &str,
    section: NnSection,
) -> Result<PathBuf, CorrectionError> {
    let dir = locations.write_dir();
    let metadata_path = dir.join(metadata_file_name(participant_id));
    let now = now_rfc3339();

    let (mut metadata, upgraded_legacy) =
        match document::load_for_update(&metadata_path, format::decode_file)? {
            Some(decoded) => (write_upgraded(&dir, participant_id, decoded.record)?, None),
            None => {
                let legacy_path = dir.join(legacy_file_name(participant_id));
                match document::load_for_update(&legacy_path, format::decode_file)? {
                    Some(decoded) => (
                        write_upgraded(&dir, participant_id, decoded.record)?,
                        Some(legacy_path),
                    ),
                    None => (NnMetadataV2_0::new(participant_id, now.clone()), None),
                }
            }
        };

    let csv_name = csv_file_name(participant_id, section_name);
    let csv_path = dir.join(&csv_name);
    document::write_bytes(&csv_path, &csv_file::encode(&csv_path, &section.intervals)?)?;

    let mut section_metadata = section.metadata;
    section_metadata.csv_file = Some(csv_name);
    metadata.sections.insert(section_name.to_string(), section_metadata);
    metadata.participant_id = Some(participant_id.to_string());
    metadata.format_version = format::CURRENT_VERSION;
    metadata.created_at.get_or_insert_with(|| now.clone());
    metadata.last_modified = Some(now);
    document::write_document(&metadata_path, &metadata)?;

    if let Some(legacy_path) = upgraded_legacy {
        document::remove_if_exists(&legacy_path)?;
        info!(
            participant = participant_id,
            path = %legacy_path.display(),
            "Converted inline NN intervals to per-section files"
        );
    }
    info!(
        participant = participant_id,
        section = section_name,
        rows = section.intervals.len(),
        path = %csv_path.display(),
        "Saved NN intervals"
    );
    Ok(csv_path)
}

/// Load every section with its rows.
pub fn load_all(locations: &StoreLocations, participant_id: &str) -> Loaded<NnIntervalSeries> {
    load_filtered(locations, participant_id, |_| true)
}

/// Load one section with its rows.
pub fn load_section(
    locations: &StoreLocations,
    participant_id: &str,
    section_name: &str,
) -> Loaded<NnSection> {
    load_filtered(locations, participant_id, |name| name == section_name)
        .and_then(|mut series| series.sections.remove(section_name))
}

/// Names of sections with saved intervals, empty when nothing is saved.
pub fn list_sections(locations: &StoreLocations, participant_id: &str) -> Loaded<Vec<String>> {
    let Loaded { value, warnings } = load_filtered(locations, participant_id, |_| false);
    let names = value
        .map(|series| series.sections.into_keys().collect())
        .unwrap_or_default();
    Loaded::found(names, warnings)
}

/// Per-section counts; `nn_count` falls back to the row count.
pub fn summary(
    locations: &StoreLocations,
    participant_id: &str,
) -> Loaded<BTreeMap<String, NnSummary>> {
    load_all(locations, participant_id).map(|series| {
        series
            .sections
            .into_iter()
            .map(|(name, section)| {
                let metadata = section.metadata;
                let summary = NnSummary {
                    nn_count: metadata.final_nn_count.unwrap_or(section.intervals.len()),
                    correction_method: metadata
                        .correction_method
                        .unwrap_or_else(|| "unknown".to_string()),
                    corrected_at: metadata.corrected_at,
                    intervals_corrected: metadata.intervals_corrected.unwrap_or(0),
                };
                (name, summary)
            })
            .collect()
    })
}

/// Delete one section, or everything when `section_name` is `None`, from
/// every read location. Reports whether anything was removed.
pub fn delete(
    locations: &StoreLocations,
    participant_id: &str,
    section_name: Option<&str>,
) -> Result<bool, CorrectionError> {
    let mut removed = false;
    for dir in locations.read_dirs() {
        removed |= delete_current_layout(&dir, participant_id, section_name)?;
        removed |= delete_legacy_layout(&dir, participant_id, section_name)?;
    }
    Ok(removed)
}

fn delete_current_layout(
    dir: &Path,
    participant_id: &str,
    section_name: Option<&str>,
) -> Result<bool, CorrectionError> {
    let metadata_path = dir.join(metadata_file_name(participant_id));
    let metadata = match document::read_document(&metadata_path) {
        Candidate::Found(value) => serde_yaml::from_value::<NnMetadataV2_0>(value).ok(),
        Candidate::Missing | Candidate::Invalid(_) => None,
    };
    let mut removed = false;
    match section_name {
        Some(name) => {
            let listed = metadata.as_ref().and_then(|meta| meta.sections.get(name));
            removed |= document::remove_if_exists(&section_csv_path(dir, participant_id, name, listed))?;
            if let Some(mut metadata) = metadata
                && metadata.sections.remove(name).is_some()
            {
                metadata.last_modified = Some(now_rfc3339());
                document::write_document(&metadata_path, &metadata)?;
                removed = true;
            }
        }
        None => {
            if let Some(metadata) = &metadata {
                for (name, section) in &metadata.sections {
                    removed |= document::remove_if_exists(&section_csv_path(
                        dir,
                        participant_id,
                        name,
                        Some(section),
                    ))?;
                }
            }
            for csv_path in section_csv_files(dir, participant_id) {
                removed |= document::remove_if_exists(&csv_path)?;
            }
            removed |= document::remove_if_exists(&metadata_path)?;
        }
    }
    Ok(removed)
}

/// Every `<participant>_*_nn.csv` in `dir`, listed in metadata or not.
fn section_csv_files(dir: &Path, participant_id: &str) -> Vec<PathBuf> {
    let prefix = format!("{}_", file_stem(participant_id));
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.len() >= prefix.len() + "_nn.csv".len()
                && name.starts_with(&prefix)
                && name.ends_with("_nn.csv")
        })
        .map(|entry| entry.path())
        .collect()
}

fn delete_legacy_layout(
    dir: &Path,
    participant_id: &str,
    section_name: Option<&str>,
) -> Result<bool, CorrectionError> {
    let legacy_path = dir.join(legacy_file_name(participant_id));
    let Some(name) = section_name else {
        return document::remove_if_exists(&legacy_path);
    };
    let Candidate::Found(mut value) = document::read_document(&legacy_path) else {
        return Ok(false);
    };
    let removed = value
        .get_mut("sections")
        .and_then(Value::as_mapping_mut)
        .and_then(|sections| sections.remove(name))
        .is_some();
    if removed {
        if let Some(mapping) = value.as_mapping_mut() {
            mapping.insert("last_modified".into(), now_rfc3339().into());
        }
        document::write_document(&legacy_path, &value)?;
    }
    Ok(removed)
}

/// Walk the read chain; in each directory the current layout is tried
/// before the inline one. Rows are read only for sections `wants_rows` accepts.
fn load_filtered(
    locations: &StoreLocations,
    participant_id: &str,
    wants_rows: impl Fn(&str) -> bool,
) -> Loaded<NnIntervalSeries> {
    let candidates = locations.read_dirs().into_iter().flat_map(|dir| {
        [
            dir.join(metadata_file_name(participant_id)),
            dir.join(legacy_file_name(participant_id)),
        ]
    });
    let Loaded {
        value,
        mut warnings,
    } = document::first_document(candidates, format::decode_file);
    let Some((source_path, decoded)) = value else {
        return Loaded::missing(warnings);
    };

    let dir = source_path.parent().unwrap_or(Path::new(".")).to_path_buf();
    let UpgradedNn {
        metadata,
        mut rows,
    } = upgrade(decoded.record);
    let mut sections = BTreeMap::new();
    for (name, section_metadata) in metadata.sections {
        let intervals = match rows.remove(&name) {
            Some(inline) => inline,
            None if wants_rows(&name) => {
                let csv_path = section_csv_path(&dir, participant_id, &name, Some(&section_metadata));
                read_section_rows(&csv_path, &mut warnings)
            }
            None => Vec::new(),
        };
        sections.insert(
            name,
            NnSection {
                metadata: section_metadata,
                intervals,
            },
        );
    }
    Loaded::found(
        NnIntervalSeries {
            participant_id: metadata
                .participant_id
                .unwrap_or_else(|| participant_id.to_string()),
            stored_version: decoded.stored_version,
            created_at: metadata.created_at,
            last_modified: metadata.last_modified,
            sections,
            source_path,
        },
        warnings,
    )
}

fn upgrade(record: NnRecord) -> UpgradedNn {
    match record {
        NnRecord::V1_0(legacy) => v1_0_to_v2_0(legacy),
        NnRecord::V2_0(metadata) => UpgradedNn {
            metadata,
            rows: BTreeMap::new(),
        },
    }
}

/// Upgrade `record` and write any inline rows out as section files in `dir`.
fn write_upgraded(
    dir: &Path,
    participant_id: &str,
    record: NnRecord,
) -> Result<NnMetadataV2_0, CorrectionError> {
    let UpgradedNn { mut metadata, rows } = upgrade(record);
    for (name, intervals) in rows {
        let csv_name = csv_file_name(participant_id, &name);
        let csv_path = dir.join(&csv_name);
        document::write_bytes(&csv_path, &csv_file::encode(&csv_path, &intervals)?)?;
        if let Some(section) = metadata.sections.get_mut(&name) {
            section.csv_file = Some(csv_name);
        }
    }
    Ok(metadata)
}

/// Row file for a section, preferring the name recorded in metadata.
fn section_csv_path(
    dir: &Path,
    participant_id: &str,
    section_name: &str,
    metadata: Option<&NnSectionMetadata>,
) -> PathBuf {
    let recorded = metadata
        .and_then(|meta| meta.csv_file.as_deref())
        .and_then(|name| Path::new(name).file_name());
    match recorded {
        Some(name) => dir.join(name),
        None => dir.join(csv_file_name(participant_id, section_name)),
    }
}

fn read_section_rows(path: &Path, warnings: &mut Vec<StoreWarning>) -> Vec<NnInterval> {
    match fs::read(path) {
        Ok(bytes) => {
            let decoded = csv_file::decode(&bytes);
            if decoded.skipped > 0 {
                warnings.push(StoreWarning::new(
                    path,
                    format!("{} unreadable interval rows left out", decoded.skipped),
                ));
            }
            decoded.intervals
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warnings.push(StoreWarning::new(
                path,
                "interval rows missing for a listed section",
            ));
            Vec::new()
        }
        Err(err) => {
            warnings.push(StoreWarning::new(path, format!("unreadable: {err}")));
            Vec::new()
        }
    }
}
