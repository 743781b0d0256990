//! Calendar parsing and formatting shared by admin forms, the calendar feed and JSON payloads.
//!
//! Event times are wall-clock values for the venue and are stored without an offset.

use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};

use super::error::DomainError;

time::serde::format_description!(
    pub local_datetime,
    PrimitiveDateTime,
    "[year]-[month]-[day]T[hour]:[minute]:[second]"
);

time::serde::format_description!(pub calendar_date, Date, "[year]-[month]-[day]");

/// Parse the accepted wall-clock spellings: `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM`
/// (HTML `datetime-local`), with seconds, with fractional seconds, with a space
/// separator, or a full RFC 3339 value whose offset is dropped.
pub fn parse_local_datetime(input: &str) -> Result<PrimitiveDateTime, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("datetime value is required"));
    }

    if let Ok(value) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return Ok(PrimitiveDateTime::new(value.date(), value.time()));
    }

    let candidate = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    let fractional = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
    let seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let minutes = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    let spaced = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

    PrimitiveDateTime::parse(candidate, fractional)
        .or_else(|_| PrimitiveDateTime::parse(candidate, seconds))
        .or_else(|_| PrimitiveDateTime::parse(candidate, minutes))
        .or_else(|_| PrimitiveDateTime::parse(candidate, spaced))
        .or_else(|_| parse_calendar_date(candidate).map(Date::midnight))
        .map_err(|_| DomainError::validation(format!("invalid datetime `{trimmed}`")))
}

pub fn parse_calendar_date(input: &str) -> Result<Date, DomainError> {
    let trimmed = input.trim();
    Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
        .map_err(|_| DomainError::validation(format!("invalid date `{trimmed}`, expected YYYY-MM-DD")))
}

pub fn format_local_datetime(value: PrimitiveDateTime) -> String {
    value
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second]"
        ))
        .unwrap_or_default()
}

/// Value suitable for an HTML `datetime-local` input.
pub fn format_datetime_input(value: PrimitiveDateTime) -> String {
    value
        .format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .unwrap_or_default()
}

pub fn format_calendar_date(value: Date) -> String {
    value
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_default()
}

/// Current UTC wall-clock time without offset, comparable with stored event times.
pub fn now_local() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn accepts_datetime_local_input() {
        let parsed = parse_local_datetime("2025-05-01T19:30").expect("parse");
        assert_eq!(parsed, datetime!(2025-05-01 19:30));
    }

    #[test]
    fn accepts_plain_dates_as_midnight() {
        let parsed = parse_local_datetime("2025-01-31").expect("parse");
        assert_eq!(parsed, datetime!(2025-01-31 0:00));
    }

    #[test]
    fn drops_offsets_and_zulu_suffix() {
        assert_eq!(
            parse_local_datetime("2025-01-01T08:00:00-05:00").expect("parse"),
            datetime!(2025-01-01 8:00)
        );
        assert_eq!(
            parse_local_datetime("2025-01-01T08:00:00Z").expect("parse"),
            datetime!(2025-01-01 8:00)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_local_datetime("yesterday").is_err());
        assert!(parse_local_datetime("2025-13-01").is_err());
        assert!(parse_local_datetime("   ").is_err());
    }

    #[test]
    fn formats_round_trip_through_input_format() {
        let value = datetime!(2025-02-03 04:05:06);
        assert_eq!(format_local_datetime(value), "2025-02-03T04:05:06");
        assert_eq!(format_datetime_input(value), "2025-02-03T04:05");
    }
}
