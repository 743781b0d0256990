use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, warn};

use crate::application::error::HttpError;
use crate::infra::http::session::{cleared_cookie, session_cookie};

use super::AdminState;
use super::form::AdminForm;

const SOURCE: &str = "infra::http::admin::auth";

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Admin login</title></head>
<body>
<form method="post" action="/admin/login">
<label>Username <input name="username" autocomplete="username" required></label>
<label>Password <input name="password" type="password" autocomplete="current-password" required></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#;

pub(super) async fn login_form() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

pub(super) async fn login(
    State(state): State<AdminState>,
    jar: CookieJar,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let username = form.text("username").unwrap_or_default().trim();
    let password = form.text("password").unwrap_or_default();

    if !state.credentials.verify(username, password) {
        warn!(target = SOURCE, username, "admin login rejected");
        return Err(HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Invalid credentials",
            format!("credential check failed for `{username}`"),
        ));
    }

    let token = state.sessions.issue(username);
    let jar = jar.add(session_cookie(&state.sessions, token));
    info!(target = SOURCE, username, "admin signed in");
    Ok((jar, Redirect::to("/admin")).into_response())
}

pub(super) async fn logout(jar: CookieJar) -> Response {
    (jar.remove(cleared_cookie()), Redirect::to("/")).into_response()
}
