//! On-disk artifact record layouts, one struct per format version.
//!
//! Older layouts keep every field at the top level; 1.3 nests them per
//! section. Each transition has its own upgrade function and
//! [`ArtifactRecord::upgrade`] composes them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use super::super::{FormatVersion, SOURCE_TYPE, SectionKey, null_as_default};

fn default_source() -> String {
    "manual".to_string()
}

/// One user-entered artifact marking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualArtifact {
    #[serde(default)]
    pub original_idx: usize,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub rr_value: f64,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_idx: Option<usize>,
    /// Keys written by other tools, carried through unchanged.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ManualArtifact {
    pub fn new(original_idx: usize, timestamp: Option<String>, rr_value: f64) -> Self {
        Self {
            original_idx,
            timestamp,
            rr_value,
            source: default_source(),
            plot_idx: None,
            extra: BTreeMap::new(),
        }
    }
}

/// How the boundaries of a detection pass were chosen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionScope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Corrections stored for one section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub algorithm_artifact_indices: BTreeSet<usize>,
    #[serde(default)]
    pub algorithm_method: Option<String>,
    /// Free-form: a number for most detectors, text for adaptive ones.
    #[serde(default)]
    pub algorithm_threshold: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub manual_artifacts: Vec<ManualArtifact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded_artifact_indices: BTreeSet<usize>,
    #[serde(default)]
    pub scope: Option<DetectionScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_beats: Option<usize>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub indices_by_type: BTreeMap<String, BTreeSet<usize>>,
    /// Opaque corrected series kept from 1.2 records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_rr: Option<Value>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

/// Manual markings and exclusions only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtifactsV1_0 {
    #[serde(default, deserialize_with = "null_as_default")]
    pub manual_artifacts: Vec<ManualArtifact>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub excluded_artifact_indices: BTreeSet<usize>,
    #[serde(default)]
    pub saved_at: Option<String>,
}

/// Adds automated detection results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtifactsV1_1 {
    #[serde(flatten)]
    pub base: ArtifactsV1_0,
    #[serde(default, deserialize_with = "null_as_default")]
    pub algorithm_artifact_indices: BTreeSet<usize>,
    #[serde(default)]
    pub algorithm_method: Option<String>,
    #[serde(default)]
    pub algorithm_threshold: Option<Value>,
}

/// Adds the detection scope and an inline corrected series.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ArtifactsV1_2 {
    #[serde(flatten)]
    pub base: ArtifactsV1_1,
    #[serde(default)]
    pub scope: Option<DetectionScope>,
    #[serde(default)]
    pub corrected_rr: Option<Value>,
}

/// Section-scoped layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactsV1_3 {
    #[serde(default)]
    pub participant_id: Option<String>,
    #[serde(skip_deserializing, default = "current_version")]
    pub format_version: FormatVersion,
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: BTreeMap<SectionKey, ArtifactSection>,
    #[serde(default)]
    pub last_modified: Option<String>,
}

pub const CURRENT_VERSION: FormatVersion = FormatVersion::new(1, 3);

fn current_version() -> FormatVersion {
    CURRENT_VERSION
}

fn default_source_type() -> String {
    SOURCE_TYPE.to_string()
}

impl Default for ArtifactsV1_3 {
    fn default() -> Self {
        Self {
            participant_id: None,
            format_version: CURRENT_VERSION,
            source_type: default_source_type(),
            sections: BTreeMap::new(),
            last_modified: None,
        }
    }
}

impl ArtifactsV1_3 {
    /// Store `section` under `key`, keeping `_full` and named sections exclusive.
    pub fn upsert(&mut self, key: SectionKey, section: ArtifactSection) {
        match key {
            SectionKey::Full => self.sections.clear(),
            SectionKey::Named(_) => {
                self.sections.remove(&SectionKey::Full);
            }
        }
        self.sections.insert(key, section);
    }
}

pub fn v1_0_to_v1_1(record: ArtifactsV1_0) -> ArtifactsV1_1 {
    ArtifactsV1_1 {
        base: record,
        ..ArtifactsV1_1::default()
    }
}

pub fn v1_1_to_v1_2(record: ArtifactsV1_1) -> ArtifactsV1_2 {
    ArtifactsV1_2 {
        base: record,
        scope: None,
        corrected_rr: None,
    }
}

/// Re-nest the top-level fields as the `_full` section.
pub fn v1_2_to_v1_3(record: ArtifactsV1_2) -> ArtifactsV1_3 {
    let ArtifactsV1_2 {
        base:
            ArtifactsV1_1 {
                base:
                    ArtifactsV1_0 {
                        manual_artifacts,
                        excluded_artifact_indices,
                        saved_at,
                    },
                algorithm_artifact_indices,
                algorithm_method,
                algorithm_threshold,
            },
        scope,
        corrected_rr,
    } = record;
    let section = ArtifactSection {
        algorithm_artifact_indices,
        algorithm_method,
        algorithm_threshold,
        manual_artifacts,
        excluded_artifact_indices,
        scope,
        corrected_rr,
        saved_at: saved_at.clone(),
        ..ArtifactSection::default()
    };
    ArtifactsV1_3 {
        sections: BTreeMap::from([(SectionKey::Full, section)]),
        last_modified: saved_at,
        ..ArtifactsV1_3::default()
    }
}

/// Any artifact layout this crate has ever written.
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactRecord {
    V1_0(ArtifactsV1_0),
    V1_1(ArtifactsV1_1),
    V1_2(ArtifactsV1_2),
    V1_3(ArtifactsV1_3),
}

impl ArtifactRecord {
    /// Pick the layout from the keys present, then decode it.
    ///
    /// A `sections` map always means the sectioned layout. Otherwise the
    /// newest layout whose fields appear is used.
    pub fn decode(document: Value) -> Result<Self, serde_yaml::Error> {
        let has = |key: &str| document.get(key).is_some();
        if has("sections") {
            return serde_yaml::from_value(document).map(Self::V1_3);
        }
        if has("scope") || has("corrected_rr") {
            return serde_yaml::from_value(document).map(Self::V1_2);
        }
        if has("algorithm_artifact_indices") || has("algorithm_method") {
            return serde_yaml::from_value(document).map(Self::V1_1);
        }
        serde_yaml::from_value(document).map(Self::V1_0)
    }

    pub fn is_sectioned(&self) -> bool {
        matches!(self, Self::V1_3(_))
    }

    /// Apply every upgrade between this layout and 1.3.
    pub fn upgrade(self) -> ArtifactsV1_3 {
        match self {
            Self::V1_0(record) => v1_2_to_v1_3(v1_1_to_v1_2(v1_0_to_v1_1(record))),
            Self::V1_1(record) => v1_2_to_v1_3(v1_1_to_v1_2(record)),
            Self::V1_2(record) => v1_2_to_v1_3(record),
            Self::V1_3(record) => record,
        }
    }
}

/// A decoded artifact file and the version it declared.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArtifacts {
    pub stored_version: FormatVersion,
    pub record: ArtifactRecord,
}

pub fn decode_file(_path: &Path, document: Value) -> Result<DecodedArtifacts, serde_yaml::Error> {
    let stored_version = FormatVersion::of_document(&document);
    Ok(DecodedArtifacts {
        stored_version,
        record: ArtifactRecord::decode(document)?,
    })
}
