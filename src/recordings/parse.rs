//! Typed beat and event records from normalized CSV rows.
//!
//! Both parsers are total: rows that lack required columns or carry
//! unparsable values are skipped, and only filesystem errors propagate.

use std::path::Path;

use super::csv_rows::{NormalizedRow, read_rows};
use super::timestamps::parse_timestamp;
use super::{BeatInterval, EventMarker, RecordingError};

const BEAT_REQUIRED_COLUMNS: [&str; 2] = ["date", "rr"];
const ELAPSED_COLUMNS: [&str; 2] = ["since start", "since_start"];
const EVENT_REQUIRED_COLUMNS: [&str; 2] = ["annotation", "timestamp"];

/// Parse the beat (RR) file at `path`.
pub fn load_beat_intervals(path: &Path) -> Result<Vec<BeatInterval>, RecordingError> {
    Ok(parse_beat_rows(&read_rows(path)?))
}

/// Parse the event file at `path`.
pub fn load_event_markers(path: &Path) -> Result<Vec<EventMarker>, RecordingError> {
    Ok(parse_event_rows(&read_rows(path)?))
}

/// Convert normalized rows into beat intervals, skipping unusable rows.
pub fn parse_beat_rows(rows: &[NormalizedRow]) -> Vec<BeatInterval> {
    rows.iter()
        .filter(|row| row.has_columns(&BEAT_REQUIRED_COLUMNS))
        .filter_map(|row| {
            let duration_ms = row.non_empty("rr").and_then(parse_rounded_int)?;
            let elapsed_ms = ELAPSED_COLUMNS
                .iter()
                .find_map(|column| row.non_empty(column))
                .and_then(parse_rounded_int);
            Some(BeatInterval {
                timestamp: row.non_empty("date").and_then(parse_timestamp),
                duration_ms,
                elapsed_ms,
            })
        })
        .collect()
}

/// Convert normalized rows into event markers, skipping unlabeled rows.
pub fn parse_event_rows(rows: &[NormalizedRow]) -> Vec<EventMarker> {
    rows.iter()
        .filter(|row| row.has_columns(&EVENT_REQUIRED_COLUMNS))
        .filter_map(|row| {
            let label = row.non_empty("annotation")?;
            Some(EventMarker {
                label: label.to_string(),
                timestamp: row.non_empty("date").and_then(parse_timestamp),
                offset_s: row.non_empty("timestamp").and_then(parse_finite_float),
            })
        })
        .collect()
}

/// Nearest integer of a possibly fractional numeric string.
pub fn parse_rounded_int(value: &str) -> Option<i64> {
    let number = parse_finite_float(value)?.round();
    if number < i64::MIN as f64 || number > i64::MAX as f64 {
        return None;
    }
    Some(number as i64)
}

fn parse_finite_float(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recordings::csv_rows::normalize_rows;
    use time::macros::datetime;

    const BEATS: &str = "\
date,rr,since start
2024-03-05 10:00:00 +0100,812,0
2024-03-05 10:00:01 +0100,799.6,812
2024-03-05 10:00:02 +0100,abc,1612
2024-03-05 10:00:03 +0100,,2412
not a date,805.4,
";

    #[test]
    fn parses_beats_and_skips_unparsable_rr() {
        let beats = parse_beat_rows(&normalize_rows(BEATS.as_bytes()));
        assert_eq!(beats.len(), 3);
        assert_eq!(beats[0].duration_ms, 812);
        assert_eq!(beats[0].elapsed_ms, Some(0));
        assert_eq!(beats[0].timestamp, Some(datetime!(2024-03-05 10:00:00 +01:00)));
        assert_eq!(beats[1].duration_ms, 800);
        assert_eq!(beats[2].duration_ms, 805);
        assert_eq!(beats[2].timestamp, None);
        assert_eq!(beats[2].elapsed_ms, None);
    }

    #[test]
    fn accepts_underscore_elapsed_header() {
        let rows = normalize_rows(b"DATE,RR,Since_Start\nx,900,1500.2\n");
        let beats = parse_beat_rows(&rows);
        assert_eq!(beats[0].elapsed_ms, Some(1500));
    }

    #[test]
    fn beat_rows_without_required_columns_are_ignored() {
        let rows = normalize_rows(b"time,interval\nx,900\n");
        assert!(parse_beat_rows(&rows).is_empty());
    }

    #[test]
    fn beat_parsing_is_repeatable() {
        let rows = normalize_rows(BEATS.as_bytes());
        assert_eq!(parse_beat_rows(&rows), parse_beat_rows(&rows));
    }

    #[test]
    fn parses_events_with_offsets() {
        let rows = normalize_rows(
            b"Date,Timestamp,Annotation\n\
2024-03-05 10:00:00 +0100,0.5,Ruhe Anfang\n\
2024-03-05 10:05:00 +0100,300,\n\
,oops,Ruhe Ende\n",
        );
        let events = parse_event_rows(&rows);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].label, "Ruhe Anfang");
        assert_eq!(events[0].offset_s, Some(0.5));
        assert_eq!(
            events[0].timestamp,
            Some(datetime!(2024-03-05 10:00:00 +01:00))
        );
        assert_eq!(events[1].label, "Ruhe Ende");
        assert_eq!(events[1].offset_s, None);
        assert_eq!(events[1].timestamp, None);
    }

    #[test]
    fn event_rows_need_timestamp_column() {
        let rows = normalize_rows(b"annotation\nstart\n");
        assert!(parse_event_rows(&rows).is_empty());
    }

    #[test]
    fn rounded_int_rejects_non_numbers() {
        assert_eq!(parse_rounded_int("12.5"), Some(13));
        assert_eq!(parse_rounded_int("-3.2"), Some(-3));
        assert_eq!(parse_rounded_int("NaN"), None);
        assert_eq!(parse_rounded_int("inf"), None);
        assert_eq!(parse_rounded_int("1e400"), None);
        assert_eq!(parse_rounded_int("12ms"), None);
    }
}
