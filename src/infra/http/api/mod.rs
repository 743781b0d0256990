pub mod error;
mod events;
mod forms;
mod menu;
pub mod models;
mod uploads;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::application::{
    admin::{AdminMenuService, AdminTaxonomyService},
    auth::SessionManager,
    media::MediaService,
    public::PublicService,
    submissions::SubmissionService,
};
use crate::infra::http::{RouterState, session::require_api_session};

#[derive(Clone)]
pub struct ApiState {
    pub public: Arc<PublicService>,
    pub submissions: Arc<SubmissionService>,
    pub menu: Arc<AdminMenuService>,
    pub taxonomy: Arc<AdminTaxonomyService>,
    pub media: MediaService,
}

/// Reads and public submissions are open; menu mutations and uploads need an
/// admin session.
pub(super) fn build_api_router(sessions: Arc<SessionManager>) -> Router<RouterState> {
    let open = Router::new()
        .route("/events/data", get(events::calendar_feed))
        .route("/events", get(events::upcoming))
        .route("/categories", get(menu::list_categories))
        .route("/tags", get(menu::list_tags))
        .route("/items", get(menu::list_items))
        .route("/musician", post(forms::musician))
        .route("/rental", post(forms::rental))
        .route("/contact", post(forms::contact));

    let protected = Router::new()
        .route("/categories", post(menu::create_category))
        .route("/categories/{id}", delete(menu::delete_category))
        .route("/tags", post(menu::create_tag))
        .route("/tags/{id}", delete(menu::delete_tag))
        .route("/items", post(menu::create_item))
        .route(
            "/items/{id}",
            put(menu::update_item).delete(menu::delete_item),
        )
        .route("/items/featured", post(menu::set_featured_order))
        .route("/upload", post(uploads::upload_file))
        .route_layer(axum_middleware::from_fn_with_state(
            sessions,
            require_api_session,
        ));

    open.merge(protected)
}
