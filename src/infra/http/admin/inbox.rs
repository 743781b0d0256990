use axum::{
    Json,
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;

use crate::application::error::HttpError;
use crate::domain::entities::{MusicianAppRecord, RentalRecord};

use super::form::AdminForm;
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::inbox";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct InboxQuery {
    status: Option<String>,
    area: Option<String>,
    q: Option<String>,
}

pub(super) async fn admin_rentals(
    State(state): State<AdminState>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Vec<RentalRecord>>, HttpError> {
    state
        .inbox
        .list_rentals(query.status, query.area, query.q)
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_rental_status(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let id = form.required_id("id")?;
    let status = form.required("status")?;
    state
        .inbox
        .set_rental_status(id, status)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other("/admin/rentals"))
}

pub(super) async fn admin_musicians(
    State(state): State<AdminState>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Vec<MusicianAppRecord>>, HttpError> {
    state
        .inbox
        .list_applications(query.status, query.q)
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_musician_status(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let id = form.required_id("id")?;
    let status = form.required("status")?;
    state
        .inbox
        .set_application_status(id, status)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other("/admin/musician"))
}
