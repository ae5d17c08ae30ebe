//! Per-section interval rows: `beat_idx,timestamp_ms,nn_ms,was_corrected`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::CorrectionError;
use super::NnInterval;

#[derive(Debug, Serialize, Deserialize)]
struct Row {
    beat_idx: usize,
    timestamp_ms: i64,
    nn_ms: f64,
    was_corrected: bool,
}

/// Encode `intervals` with the fixed header, one row per beat.
pub fn encode(path: &Path, intervals: &[NnInterval]) -> Result<Vec<u8>, CorrectionError> {
    let csv_error = |source| CorrectionError::WriteCsv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (beat_idx, interval) in intervals.iter().enumerate() {
        writer
            .serialize(Row {
                beat_idx,
                timestamp_ms: interval.elapsed_ms,
                nn_ms: interval.interval_ms,
                was_corrected: interval.was_interpolated,
            })
            .map_err(csv_error)?;
    }
    if intervals.is_empty() {
        writer
            .write_record(["beat_idx", "timestamp_ms", "nn_ms", "was_corrected"])
            .map_err(csv_error)?;
    }
    writer
        .into_inner()
        .map_err(|err| CorrectionError::Write {
            path: path.to_path_buf(),
            source: err.into_error(),
        })
}

/// Rows read back from a section file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedRows {
    pub intervals: Vec<NnInterval>,
    /// Rows that did not parse and were left out.
    pub skipped: usize,
}

/// Decode interval rows, counting rows that do not parse.
pub fn decode(bytes: &[u8]) -> DecodedRows {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let mut decoded = DecodedRows::default();
    for (line, row) in reader.deserialize::<Row>().enumerate() {
        match row {
            Ok(row) => decoded.intervals.push(NnInterval {
                elapsed_ms: row.timestamp_ms,
                interval_ms: row.nn_ms,
                was_interpolated: row.was_corrected,
            }),
            Err(err) => {
                debug!(row = line + 1, error = %err, "Skipping malformed interval row");
                decoded.skipped += 1;
            }
        }
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_fixed_header_and_lowercase_flags() {
        let bytes = encode(
            Path::new("x.csv"),
            &[NnInterval {
                elapsed_ms: 0,
                interval_ms: 850.0,
                was_interpolated: true,
            }],
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "beat_idx,timestamp_ms,nn_ms,was_corrected\n0,0,850.0,true\n");
    }

    #[test]
    fn empty_series_still_has_header() {
        let bytes = encode(Path::new("x.csv"), &[]).unwrap();
        assert_eq!(bytes, b"beat_idx,timestamp_ms,nn_ms,was_corrected\n");
    }

    #[test]
    fn reads_integer_values_and_skips_bad_rows() {
        let decoded = decode(b"beat_idx,timestamp_ms,nn_ms,was_corrected\n0,0,850,false\n1,x,858,true\n2,1708,855,true\n");
        assert_eq!(decoded.skipped, 1);
        let rows = decoded.intervals;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].elapsed_ms, 1708);
        assert_eq!(rows[1].interval_ms, 855.0);
        assert!(rows[1].was_interpolated);
    }
}
