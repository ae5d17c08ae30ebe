//! Versioned, section-scoped persistence of per-participant corrections.
//!
//! Four independent categories share one protocol: artifact markings,
//! section validations, corrected NN-interval series and generic event edits.
//! Writes always land in [`StoreLocations::write_dir`]; reads walk
//! [`StoreLocations::read_dirs`] and the first usable file wins. Reads never
//! fail: unreadable records are reported as [`StoreWarning`]s.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub mod artifacts;
mod document;
mod errors;
mod locations;
pub mod migrate;
pub mod nn_intervals;
mod outcome;
pub mod participant_events;
pub mod validations;
mod version;

pub use errors::CorrectionError;
pub use locations::StoreLocations;
pub use outcome::{Loaded, MigrationOutcome, MigrationReport, StoreWarning};
pub use version::FormatVersion;

/// Provenance tag stamped on records written by this crate.
pub const SOURCE_TYPE: &str = "rrational_toolkit";

const FULL_SECTION: &str = "_full";

/// Scope of a set of corrections: the whole recording or one named section.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionKey {
    Full,
    Named(String),
}

impl SectionKey {
    pub fn named(name: impl Into<String>) -> Self {
        Self::from(name.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Full => FULL_SECTION,
            Self::Named(name) => name,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full)
    }
}

impl From<String> for SectionKey {
    fn from(value: String) -> Self {
        if value == FULL_SECTION {
            Self::Full
        } else {
            Self::Named(value)
        }
    }
}

impl From<&str> for SectionKey {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SectionKey> for String {
    fn from(key: SectionKey) -> Self {
        match key {
            SectionKey::Full => FULL_SECTION.to_string(),
            SectionKey::Named(name) => name,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current local time as RFC 3339, falling back to UTC when the offset is unknown.
pub(crate) fn now_rfc3339() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&Rfc3339).unwrap_or_default()
}

/// Treat an explicit YAML `null` like a missing key.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn section_key_round_trips_through_yaml_keys() {
        let mut map = BTreeMap::new();
        map.insert(SectionKey::named("rest_pre"), 1);
        map.insert(SectionKey::Full, 2);
        let yaml = serde_yaml::to_string(&map).unwrap();
        assert!(yaml.starts_with("_full: 2"));
        let back: BTreeMap<SectionKey, i32> = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn full_sentinel_is_recognized() {
        assert!(SectionKey::from("_full").is_full());
        assert_eq!(SectionKey::named("music_1").to_string(), "music_1");
    }
}
