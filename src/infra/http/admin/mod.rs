mod auth;
mod dashboard;
mod events;
mod form;
mod inbox;
mod menu;
mod reviews;
mod site;
mod taxonomy;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};

use crate::application::{
    admin::{
        AdminDashboardService, AdminError, AdminEventService, AdminInboxService,
        AdminMenuService, AdminReviewService, AdminSiteService, AdminTaxonomyService,
    },
    auth::{AdminCredentials, SessionManager},
    error::HttpError,
    repos::HealthRepo,
};

use super::{RouterState, repo_error_to_http, session::require_admin};

#[derive(Clone)]
pub struct AdminState {
    pub dashboard: Arc<AdminDashboardService>,
    pub menu: Arc<AdminMenuService>,
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub events: Arc<AdminEventService>,
    pub inbox: Arc<AdminInboxService>,
    pub reviews: Arc<AdminReviewService>,
    pub site: Arc<AdminSiteService>,
    pub credentials: Arc<AdminCredentials>,
    pub sessions: Arc<SessionManager>,
    pub health: Arc<dyn HealthRepo>,
}

/// Everything but the login and logout routes sits behind the session gate.
pub(super) fn build_admin_router(sessions: Arc<SessionManager>) -> Router<RouterState> {
    let open = Router::new()
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout));

    let gated = Router::new()
        .route("/", get(dashboard::admin_dashboard))
        .route("/_health/db", get(dashboard::admin_health))
        .route("/menu", get(menu::admin_menu))
        .route("/menu/create", post(menu::admin_menu_create))
        .route(
            "/menu/edit/{id}",
            get(menu::admin_menu_edit).post(menu::admin_menu_update),
        )
        .route("/menu/feature", post(menu::admin_menu_feature))
        .route("/menu/toggle/{id}", post(menu::admin_menu_toggle))
        .route("/menu/delete/{id}", post(menu::admin_menu_delete))
        .route("/menu/category/create", post(menu::admin_menu_category_create))
        .route("/menu/tag/create", post(menu::admin_menu_tag_create))
        .route("/categories", get(taxonomy::admin_categories))
        .route("/categories/create", post(taxonomy::admin_category_create))
        .route("/categories/edit/{id}", post(taxonomy::admin_category_update))
        .route(
            "/categories/delete/{id}",
            post(taxonomy::admin_category_delete),
        )
        .route("/tags", get(taxonomy::admin_tags))
        .route("/tags/create", post(taxonomy::admin_tag_create))
        .route("/tags/edit/{id}", post(taxonomy::admin_tag_update))
        .route("/tags/delete/{id}", post(taxonomy::admin_tag_delete))
        .route("/events", get(events::admin_events))
        .route("/events/create", post(events::admin_event_create))
        .route(
            "/events/edit/{id}",
            get(events::admin_event_edit).post(events::admin_event_update),
        )
        .route("/events/delete", post(events::admin_event_delete))
        .route("/events/publish/{id}", post(events::admin_event_publish))
        .route("/rentals", get(inbox::admin_rentals))
        .route("/rentals/status", post(inbox::admin_rental_status))
        .route("/musician", get(inbox::admin_musicians))
        .route("/musician/status", post(inbox::admin_musician_status))
        .route("/reviews", get(reviews::admin_reviews))
        .route("/reviews/create", post(reviews::admin_review_create))
        .route("/reviews/feature", post(reviews::admin_review_feature))
        .route("/reviews/delete", post(reviews::admin_review_delete))
        .route("/site", get(site::admin_site))
        .route("/site/basic", post(site::admin_site_basic))
        .route("/site/hours", post(site::admin_site_hours))
        .route("/site/holiday", post(site::admin_site_holiday))
        .route("/site/holiday/delete", post(site::admin_site_holiday_delete))
        .route("/cache/invalidate", post(site::admin_cache_invalidate))
        .route_layer(middleware::from_fn_with_state(sessions, require_admin));

    open.merge(gated)
}

/// 303 back to an admin screen after a successful write.
fn see_other(path: &'static str) -> Response {
    Redirect::to(path).into_response()
}

fn admin_error_to_http(source: &'static str, err: AdminError) -> HttpError {
    match err {
        AdminError::NotFound { .. } => HttpError::from_error(
            source,
            StatusCode::NOT_FOUND,
            capitalize(&err.to_string()),
            &err,
        ),
        AdminError::Validation(_) | AdminError::InUse { .. } | AdminError::Duplicate(_) => {
            HttpError::from_error(source, StatusCode::BAD_REQUEST, err.to_string(), &err)
        }
        AdminError::Repo(err) => repo_error_to_http(source, err),
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
