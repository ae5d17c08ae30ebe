//! NN-interval record layouts.
//!
//! 1.0 kept every section's rows inline in `<participant>_nn_intervals.yml`.
//! 2.0 keeps only metadata in `<participant>_nn_metadata.yml` and moves rows
//! to one CSV per section.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::super::{FormatVersion, null_as_default};
use super::{IntervalCorrection, NnInterval};

pub const CURRENT_VERSION: FormatVersion = FormatVersion::new(2, 0);
pub const METADATA_SUFFIX: &str = "_nn_metadata.yml";
pub const LEGACY_SUFFIX: &str = "_nn_intervals.yml";

fn current_version() -> FormatVersion {
    CURRENT_VERSION
}

/// Everything about one section's correction except the rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NnSectionMetadata {
    #[serde(default)]
    pub correction_method: Option<String>,
    #[serde(default)]
    pub corrected_at: Option<String>,
    #[serde(default)]
    pub original_beat_count: Option<usize>,
    #[serde(default)]
    pub artifacts_removed: Option<usize>,
    #[serde(default)]
    pub intervals_corrected: Option<usize>,
    #[serde(default)]
    pub final_nn_count: Option<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub corrections: Vec<IntervalCorrection>,
    /// Row file name, relative to the metadata file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NnMetadataV2_0 {
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(skip_deserializing, default = "current_version")]
    pub format_version: FormatVersion,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: BTreeMap<String, NnSectionMetadata>,
}

impl NnMetadataV2_0 {
    pub fn new(participant_id: &str, created_at: String) -> Self {
        Self {
            participant_id: Some(participant_id.to_string()),
            format_version: CURRENT_VERSION,
            created_at: Some(created_at),
            last_modified: None,
            sections: BTreeMap::new(),
        }
    }
}

/// Inline row as written by 1.0: `[elapsed_ms, nn_ms, was_corrected]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LegacyRow(pub i64, pub f64, pub bool);

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyNnSection {
    #[serde(flatten)]
    pub metadata: NnSectionMetadata,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intervals: Vec<LegacyRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NnIntervalsV1_0 {
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: BTreeMap<String, LegacyNnSection>,
}

/// Metadata plus the rows that belong in per-section CSV files.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradedNn {
    pub metadata: NnMetadataV2_0,
    pub rows: BTreeMap<String, Vec<NnInterval>>,
}

/// Split inline rows out of the metadata.
pub fn v1_0_to_v2_0(record: NnIntervalsV1_0) -> UpgradedNn {
    let mut rows = BTreeMap::new();
    let mut sections = BTreeMap::new();
    for (name, section) in record.sections {
        let intervals = section
            .intervals
            .into_iter()
            .map(|LegacyRow(elapsed_ms, interval_ms, was_interpolated)| NnInterval {
                elapsed_ms,
                interval_ms,
                was_interpolated,
            })
            .collect();
        rows.insert(name.clone(), intervals);
        sections.insert(name, section.metadata);
    }
    UpgradedNn {
        metadata: NnMetadataV2_0 {
            participant_id: record.participant_id,
            format_version: CURRENT_VERSION,
            created_at: record.created_at,
            last_modified: record.last_modified,
            sections,
        },
        rows,
    }
}

/// Either NN layout.
#[derive(Debug, Clone, PartialEq)]
pub enum NnRecord {
    V1_0(NnIntervalsV1_0),
    V2_0(NnMetadataV2_0),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedNn {
    pub stored_version: FormatVersion,
    pub record: NnRecord,
}

/// Decode by file name: metadata files are 2.0, inline files are 1.0.
pub fn decode_file(path: &Path, document: Value) -> Result<DecodedNn, serde_yaml::Error> {
    let is_metadata = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().ends_with(METADATA_SUFFIX));
    if is_metadata {
        let stored_version = match document.get("format_version") {
            Some(_) => FormatVersion::of_document(&document),
            None => CURRENT_VERSION,
        };
        return Ok(DecodedNn {
            stored_version,
            record: NnRecord::V2_0(serde_yaml::from_value(document)?),
        });
    }
    Ok(DecodedNn {
        stored_version: FormatVersion::of_document(&document),
        record: NnRecord::V1_0(serde_yaml::from_value(document)?),
    })
}
