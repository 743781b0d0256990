use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::domain::datetime::parse_local_datetime;

use super::ApiState;
use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
}

/// Calendar feed: published events overlapping `[start, end]`. Missing or
/// unparseable bounds answer `{ok: false, error: "bad_range"}`.
///
/// An event without an end occupies only its start instant, so an open-ended
/// event that began before `start` is not returned.
pub async fn calendar_feed(
    State(state): State<ApiState>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let start = parse_bound(query.start.as_deref(), "start")?;
    let end = parse_bound(query.end.as_deref(), "end")?;

    let entries = state.public.calendar(start, end).await?;
    Ok(Json(entries))
}

pub async fn upcoming(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let events = state.public.upcoming().await?;
    Ok(Json(events))
}

fn parse_bound(value: Option<&str>, name: &str) -> Result<time::PrimitiveDateTime, ApiError> {
    let raw = value.ok_or_else(|| ApiError::bad_range(format!("missing `{name}`")))?;
    parse_local_datetime(raw).map_err(|err| ApiError::bad_range(format!("{name}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_accept_calendar_iso_strings() {
        assert!(parse_bound(Some("2025-06-01T00:00:00Z"), "start").is_ok());
        assert!(parse_bound(Some("2025-06-01"), "start").is_ok());
        assert!(parse_bound(Some("2025-06-01T00:00:00-04:00"), "end").is_ok());
    }

    #[test]
    fn malformed_or_missing_bounds_are_bad_range() {
        let err = parse_bound(Some("not-a-date"), "start").expect_err("bad");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(parse_bound(None, "end").is_err());
    }
}
