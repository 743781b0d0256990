//! Session-cookie gate shared by the back office and the JSON API mutations.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::application::{
    auth::{AdminPrincipal, SESSION_COOKIE_NAME, SessionManager},
    error::ErrorReport,
};

pub(super) const LOGIN_PATH: &str = "/admin/login";

fn principal_from(sessions: &SessionManager, request: &Request<Body>) -> Option<AdminPrincipal> {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(SESSION_COOKIE_NAME)?;
    sessions.verify(token.value())
}

/// Admin pages: unauthenticated requests are sent to the login form.
pub(super) async fn require_admin(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(principal) = principal_from(&sessions, &request) else {
        return Redirect::to(LOGIN_PATH).into_response();
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

/// JSON mutations: unauthenticated requests get a 401 envelope instead of a redirect.
pub(super) async fn require_api_session(
    State(sessions): State<Arc<SessionManager>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(principal) = principal_from(&sessions, &request) else {
        let mut response = (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error": "unauthorized" })),
        )
            .into_response();
        ErrorReport::from_message(
            "infra::http::session",
            StatusCode::UNAUTHORIZED,
            "missing or invalid admin session",
        )
        .attach(&mut response);
        return response;
    };

    request.extensions_mut().insert(principal.clone());
    let mut response = next.run(request).await;
    response.extensions_mut().insert(principal);
    response
}

pub(super) fn session_cookie(sessions: &SessionManager, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(sessions.ttl())
        .secure(sessions.secure_cookies())
        .build()
}

pub(super) fn cleared_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, "")).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(secure: bool) -> String {
        let sessions = SessionManager::new("session-cookie-test-secret", secure);
        let token = sessions.issue("admin");
        session_cookie(&sessions, token).to_string()
    }

    #[test]
    fn cookie_is_lax_site_wide_for_eight_hours() {
        let cookie = rendered(false);
        assert!(cookie.starts_with("taproom_admin="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=28800"));
    }

    #[test]
    fn secure_flag_follows_the_session_manager() {
        assert!(rendered(true).contains("Secure"));
        assert!(!rendered(false).contains("Secure"));
    }
}
