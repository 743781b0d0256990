use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

use crate::application::{
    admin::{EventInput, ImageChange},
    error::HttpError,
};
use crate::domain::datetime::parse_local_datetime;
use crate::domain::entities::EventRecord;

use super::form::AdminForm;
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::events";
const EVENTS_PATH: &str = "/admin/events";

pub(super) async fn admin_events(
    State(state): State<AdminState>,
) -> Result<Json<Vec<EventRecord>>, HttpError> {
    state
        .events
        .list()
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_event_edit(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<EventRecord>, HttpError> {
    state
        .events
        .find(id)
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_event_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = event_input(&form)?;
    let image = form.file("image").map_or(ImageChange::Keep, ImageChange::Upload);
    state
        .events
        .create(input, image)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(EVENTS_PATH))
}

pub(super) async fn admin_event_update(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = event_input(&form)?;
    let image = form.file("image").map_or(ImageChange::Keep, ImageChange::Upload);
    state
        .events
        .update(id, input, image)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(EVENTS_PATH))
}

/// The id travels in the body as `event_id`.
pub(super) async fn admin_event_delete(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let id = form.required_id("event_id")?;
    state
        .events
        .delete(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(EVENTS_PATH))
}

pub(super) async fn admin_event_publish(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state
        .events
        .toggle_published(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(EVENTS_PATH))
}

/// `start` and `end` are `datetime-local` values. Events are published unless
/// the form explicitly unchecks `is_published`.
fn event_input(form: &AdminForm) -> Result<EventInput, HttpError> {
    let starts_at = parse_local_datetime(form.required("start")?)
        .map_err(|err| admin_error_to_http(SOURCE, err.into()))?;
    let ends_at = match form.text("end").map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_local_datetime(raw).map_err(|err| admin_error_to_http(SOURCE, err.into()))?,
        ),
    };

    Ok(EventInput {
        title: form.text("title").unwrap_or_default().to_string(),
        starts_at,
        ends_at,
        description: form.owned("description"),
        venue_area: form.owned("venue_area"),
        is_published: form
            .text("is_published")
            .is_none_or(|_| form.checked("is_published")),
        ticket_url: form.owned("ticket_url"),
    })
}
