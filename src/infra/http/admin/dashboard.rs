use axum::{
    Json,
    extract::{Extension, State},
    response::Response,
};
use serde::Serialize;

use crate::application::{admin::DashboardCounts, auth::AdminPrincipal};
use crate::infra::http::db_health_response;

use super::AdminState;

#[derive(Debug, Serialize)]
pub(super) struct DashboardView {
    username: String,
    counts: DashboardCounts,
}

pub(super) async fn admin_dashboard(
    State(state): State<AdminState>,
    Extension(principal): Extension<AdminPrincipal>,
) -> Json<DashboardView> {
    Json(DashboardView {
        username: principal.username,
        counts: state.dashboard.counts().await,
    })
}

pub(super) async fn admin_health(State(state): State<AdminState>) -> Response {
    db_health_response(state.health.ping().await)
}
