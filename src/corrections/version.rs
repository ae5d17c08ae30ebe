//! `format_version` values stamped on persisted records.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_yaml::Value;

/// Numeric `major.minor` version; ordering is numeric, not lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    /// Version assumed for records that carry none.
    pub const UNVERSIONED: FormatVersion = FormatVersion::new(1, 0);

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Read `format_version` from a document, defaulting to 1.0.
    pub fn of_document(document: &Value) -> Self {
        match document.get("format_version") {
            Some(Value::String(text)) => text.parse().unwrap_or(Self::UNVERSIONED),
            Some(Value::Number(number)) => number.to_string().parse().unwrap_or(Self::UNVERSIONED),
            _ => Self::UNVERSIONED,
        }
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        let (major, minor) = text.split_once('.').unwrap_or((text, "0"));
        let parse = |part: &str| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid format version {text:?}"))
        };
        Ok(Self::new(parse(major)?, parse(minor)?))
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl Serialize for FormatVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
