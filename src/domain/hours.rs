//! Weekly opening hours formatting.

use super::entities::HoursRecord;
use super::error::DomainError;

const MISSING_TIME: &str = "—";

/// `Mon: 11:00–22:00`, or `Mon: Closed`.
pub fn format_hours_line(row: &HoursRecord) -> String {
    let label = row.dow.label();
    if row.closed {
        return format!("{label}: Closed");
    }
    let open = display_time(&row.open_time);
    let close = display_time(&row.close_time);
    format!("{label}: {open}–{close}")
}

/// Order the rows Monday first and join one line per day. `None` when no row exists.
pub fn format_weekly_hours(rows: &[HoursRecord]) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    let mut ordered: Vec<&HoursRecord> = rows.iter().collect();
    ordered.sort_by_key(|row| row.dow);
    Some(
        ordered
            .into_iter()
            .map(format_hours_line)
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

/// Accept an empty value or a 24-hour `HH:MM` clock time.
pub fn normalize_clock(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    let invalid = || DomainError::validation(format!("invalid time `{trimmed}`, expected HH:MM"));
    let (hour, minute) = trimmed.split_once(':').ok_or_else(invalid)?;
    let hour: u8 = hour.parse().map_err(|_| invalid())?;
    let minute: u8 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 || trimmed.len() > 5 {
        return Err(invalid());
    }
    Ok(format!("{hour:02}:{minute:02}"))
}

fn display_time(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        MISSING_TIME
    } else {
        trimmed
    }
}
