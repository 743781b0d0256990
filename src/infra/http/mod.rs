mod admin;
mod api;
mod middleware;
mod public;
mod session;

pub use admin::AdminState;
pub use api::ApiState;
pub use middleware::RequestContext;
pub use public::HttpState;

use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
};

use crate::application::{
    Repositories,
    admin::{
        AdminDashboardService, AdminEventService, AdminInboxService, AdminMenuService,
        AdminReviewService, AdminSiteService, AdminTaxonomyService,
    },
    auth::{AdminCredentials, SessionManager},
    error::{ErrorReport, HttpError},
    forms::FormRelay,
    media::MediaService,
    public::PublicService,
    repos::RepoError,
    site_cache::SiteCache,
    submissions::SubmissionService,
};

use self::middleware::{log_responses, set_request_context};

fn db_health_response(result: Result<(), RepoError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

/// Map a repository error to a consistent HTTP error response for admin/public surfaces.
pub fn repo_error_to_http(source: &'static str, err: RepoError) -> HttpError {
    match err {
        RepoError::Duplicate { constraint } => {
            HttpError::new(source, StatusCode::CONFLICT, "Duplicate record", constraint)
        }
        RepoError::NotFound => HttpError::new(
            source,
            StatusCode::NOT_FOUND,
            "Resource not found",
            "resource not found",
        ),
        RepoError::InvalidInput { message } => {
            HttpError::new(source, StatusCode::BAD_REQUEST, "Invalid input", message)
        }
        RepoError::Integrity { message } => HttpError::new(
            source,
            StatusCode::CONFLICT,
            "Integrity constraint violated",
            message,
        ),
        RepoError::Timeout => HttpError::new(
            source,
            StatusCode::SERVICE_UNAVAILABLE,
            "Database timeout",
            "Database timeout",
        ),
        RepoError::Persistence(message) => HttpError::new(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Persistence error",
            message,
        ),
    }
}

/// Shared state for every surface; each router pulls its own slice through `FromRef`.
#[derive(Clone)]
pub struct RouterState {
    pub http: HttpState,
    pub api: ApiState,
    pub admin: AdminState,
    pub sessions: Arc<SessionManager>,
}

impl RouterState {
    /// Wire every service over one set of repositories.
    pub fn new(
        repos: &Repositories,
        media: MediaService,
        relay: Arc<dyn FormRelay>,
        sessions: Arc<SessionManager>,
        credentials: Arc<AdminCredentials>,
        maps_api_key: Option<String>,
    ) -> Self {
        let cache = Arc::new(SiteCache::new(repos.site.clone()));
        let public = Arc::new(PublicService::new(
            repos.menu.clone(),
            repos.events.clone(),
            repos.reviews.clone(),
            cache.clone(),
            maps_api_key,
        ));
        let submissions = Arc::new(SubmissionService::new(
            repos.rentals.clone(),
            repos.musicians.clone(),
            relay,
        ));
        let menu = Arc::new(AdminMenuService::new(
            repos.menu.clone(),
            repos.menu_write.clone(),
            media.clone(),
        ));
        let taxonomy = Arc::new(AdminTaxonomyService::new(
            repos.menu.clone(),
            repos.menu_write.clone(),
        ));

        let http = HttpState {
            public: public.clone(),
            media: media.clone(),
            health: repos.health.clone(),
        };
        let api = ApiState {
            public,
            submissions,
            menu: menu.clone(),
            taxonomy: taxonomy.clone(),
            media: media.clone(),
        };
        let admin = AdminState {
            dashboard: Arc::new(AdminDashboardService::new(
                repos.menu.clone(),
                repos.events.clone(),
                repos.rentals.clone(),
                repos.musicians.clone(),
                repos.reviews.clone(),
            )),
            menu,
            taxonomy,
            events: Arc::new(AdminEventService::new(
                repos.events.clone(),
                repos.events_write.clone(),
                media,
            )),
            inbox: Arc::new(AdminInboxService::new(
                repos.rentals.clone(),
                repos.musicians.clone(),
            )),
            reviews: Arc::new(AdminReviewService::new(repos.reviews.clone())),
            site: Arc::new(AdminSiteService::new(repos.site.clone(), cache)),
            credentials,
            sessions: sessions.clone(),
            health: repos.health.clone(),
        };

        Self {
            http,
            api,
            admin,
            sessions,
        }
    }
}

impl FromRef<RouterState> for HttpState {
    fn from_ref(state: &RouterState) -> Self {
        state.http.clone()
    }
}

impl FromRef<RouterState> for ApiState {
    fn from_ref(state: &RouterState) -> Self {
        state.api.clone()
    }
}

impl FromRef<RouterState> for AdminState {
    fn from_ref(state: &RouterState) -> Self {
        state.admin.clone()
    }
}

impl FromRef<RouterState> for Arc<SessionManager> {
    fn from_ref(state: &RouterState) -> Self {
        state.sessions.clone()
    }
}

/// Public site, `/api` and the `/admin` back office on one listener.
pub fn build_router(state: RouterState, upload_body_limit: usize) -> Router {
    public::build_public_router()
        .nest("/api", api::build_api_router(state.sessions.clone()))
        .nest("/admin", admin::build_admin_router(state.sessions.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload_body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
