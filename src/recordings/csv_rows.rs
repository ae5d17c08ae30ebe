//! Tolerant CSV reading for device exports.
//!
//! Exports arrive with mixed line endings, stray bytes and inconsistent header
//! casing. Rows are exposed as lowercase-trimmed column names mapped to trimmed
//! values.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::RecordingError;

/// One CSV row keyed by normalized column name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedRow {
    fields: HashMap<String, String>,
}

impl NormalizedRow {
    /// Value of `column`, or `None` when the header lacks it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Value of `column` when present and not blank.
    pub fn non_empty(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|value| !value.is_empty())
    }

    /// True when every listed column exists in this row.
    pub fn has_columns(&self, columns: &[&str]) -> bool {
        columns.iter().all(|column| self.fields.contains_key(*column))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for NormalizedRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Read and normalize every row of the CSV file at `path`.
pub fn read_rows(path: &Path) -> Result<Vec<NormalizedRow>, RecordingError> {
    let bytes = std::fs::read(path).map_err(|source| RecordingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize_rows(&bytes))
}

/// Decode `bytes` tolerantly and normalize each data row.
pub fn normalize_rows(bytes: &[u8]) -> Vec<NormalizedRow> {
    let text = normalize_line_endings(&decode_dropping_invalid(bytes));
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers
            .iter()
            .map(|header| header.trim().to_lowercase())
            .collect(),
        Err(err) => {
            debug!(error = %err, "CSV header unreadable; no rows produced");
            return Vec::new();
        }
    };

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                debug!(row = line + 1, error = %err, "Skipping malformed CSV row");
                continue;
            }
        };
        rows.push(
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| {
                    let value = record.get(idx).unwrap_or("").trim();
                    (header.clone(), value.to_string())
                })
                .collect(),
        );
    }
    rows
}

/// UTF-8 decode that drops invalid sequences and a leading byte-order mark.
fn decode_dropping_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
