//! Date-time parsing for device exports.
//!
//! The logger writes `YYYY-MM-DD HH:MM:SS +HHMM`; hand-edited files tend to
//! carry ISO-8601 variants instead. Values without an offset are read as UTC.

use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

type Format = &'static [BorrowedFormatItem<'static>];

const DEVICE_FORMAT: Format = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

const OFFSET_FORMATS: &[Format] = &[
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
    format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond][offset_hour sign:mandatory]:[offset_minute]"
    ),
];

const NAIVE_FORMATS: &[Format] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

const DATE_FORMAT: Format = format_description!("[year]-[month]-[day]");

/// Parse an absolute timestamp, returning `None` for blank or unknown input.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = OffsetDateTime::parse(value, DEVICE_FORMAT) {
        return Some(parsed);
    }
    parse_iso8601(value)
}

fn parse_iso8601(value: &str) -> Option<OffsetDateTime> {
    if let Ok(parsed) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(parsed);
    }
    if let Some(parsed) = OFFSET_FORMATS
        .iter()
        .find_map(|format| OffsetDateTime::parse(value, *format).ok())
    {
        return Some(parsed);
    }
    if let Some(parsed) = NAIVE_FORMATS
        .iter()
        .find_map(|format| PrimitiveDateTime::parse(value, *format).ok())
    {
        return Some(parsed.assume_utc());
    }
    Date::parse(value, DATE_FORMAT)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_device_format_with_offset() {
        let parsed = parse_timestamp("2024-03-05 10:15:30 +0100").unwrap();
        assert_eq!(parsed, datetime!(2024-03-05 10:15:30 +01:00));
    }

    #[test]
    fn falls_back_to_iso_forms() {
        assert_eq!(
            parse_timestamp("2024-03-05T10:15:30Z"),
            Some(datetime!(2024-03-05 10:15:30 UTC))
        );
        assert_eq!(
            parse_timestamp("2024-03-05T10:15:30+02:00"),
            Some(datetime!(2024-03-05 10:15:30 +02:00))
        );
        assert_eq!(
            parse_timestamp("2024-03-05 10:15:30"),
            Some(datetime!(2024-03-05 10:15:30 UTC))
        );
        assert_eq!(
            parse_timestamp("2024-03-05T10:15:30.250"),
            Some(datetime!(2024-03-05 10:15:30.25 UTC))
        );
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(datetime!(2024-03-05 0:00 UTC))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-40 99:00:00"), None);
    }
}
