use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::AdminError;
use crate::application::error::ErrorReport;
use crate::application::public::PublicError;
use crate::application::repos::RepoError;
use crate::application::submissions::SubmissionError;

pub mod codes {
    pub const BAD_RANGE: &str = "bad_range";
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const IN_USE: &str = "in_use";
    pub const UNSUPPORTED_TYPE: &str = "unsupported_type";
    pub const UPLOAD: &str = "upload_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

/// The two envelopes browser scripts understand: `{ok: false, error}` for the
/// calendar feed and `{detail}` everywhere else.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiErrorBody {
    Flag { ok: bool, error: &'static str },
    Detail { detail: Cow<'static, str> },
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    body: ApiErrorBody,
    hint: Option<String>,
}

impl ApiError {
    pub fn detail(
        status: StatusCode,
        code: &'static str,
        detail: impl Into<Cow<'static, str>>,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            body: ApiErrorBody::Detail {
                detail: detail.into(),
            },
            hint,
        }
    }

    pub fn flag(status: StatusCode, code: &'static str, hint: Option<String>) -> Self {
        Self {
            status,
            code,
            body: ApiErrorBody::Flag { ok: false, error: code },
            hint,
        }
    }

    pub fn bad_request(detail: impl Into<Cow<'static, str>>, hint: Option<String>) -> Self {
        Self::detail(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, detail, hint)
    }

    pub fn bad_range(hint: String) -> Self {
        Self::flag(StatusCode::BAD_REQUEST, codes::BAD_RANGE, Some(hint))
    }

    pub fn not_found() -> Self {
        Self::detail(StatusCode::NOT_FOUND, codes::NOT_FOUND, "Not Found", None)
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        let hint = Some(err.to_string());
        match err {
            RepoError::NotFound => Self::not_found(),
            RepoError::Duplicate { .. } => Self::detail(
                StatusCode::BAD_REQUEST,
                codes::DUPLICATE,
                "Duplicate record",
                hint,
            ),
            RepoError::InvalidInput { .. } | RepoError::Integrity { .. } => {
                Self::bad_request("Invalid input", hint)
            }
            RepoError::Timeout => Self::detail(
                StatusCode::SERVICE_UNAVAILABLE,
                codes::DB_TIMEOUT,
                "Database timeout",
                hint,
            ),
            RepoError::Persistence(_) => Self::detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::REPO,
                "Internal Server Error",
                hint,
            ),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::NotFound { .. } => Self::not_found(),
            AdminError::Validation(message) => Self::bad_request(message, None),
            AdminError::InUse { .. } => {
                Self::detail(StatusCode::BAD_REQUEST, codes::IN_USE, err.to_string(), None)
            }
            AdminError::Duplicate(message) => {
                Self::detail(StatusCode::BAD_REQUEST, codes::DUPLICATE, message, None)
            }
            AdminError::Repo(err) => Self::from(err),
        }
    }
}

impl From<PublicError> for ApiError {
    fn from(err: PublicError) -> Self {
        match err {
            PublicError::Repo(err) => Self::from(err),
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Validation(message) => Self::bad_request(message, None),
            SubmissionError::Repo(err) => Self::from(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match (&self.hint, &self.body) {
            (Some(hint), _) => hint.clone(),
            (None, ApiErrorBody::Detail { detail }) => detail.to_string(),
            (None, ApiErrorBody::Flag { error, .. }) => error.to_string(),
        };
        let mut response = (self.status, Json(self.body)).into_response();
        // Attach a structured report so shared logging middleware can emit rich diagnostics.
        ErrorReport::from_message(
            "infra::http::api",
            self.status,
            format!("{}: {detail}", self.code),
        )
        .attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_envelope_serializes_ok_false() {
        let body = serde_json::to_value(ApiErrorBody::Flag {
            ok: false,
            error: codes::BAD_RANGE,
        })
        .expect("serialize");
        assert_eq!(body, serde_json::json!({ "ok": false, "error": "bad_range" }));
    }

    #[test]
    fn in_use_keeps_the_usage_message() {
        let err = ApiError::from(AdminError::InUse {
            entity: "tag",
            count: 2,
        });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        match err.body {
            ApiErrorBody::Detail { detail } => {
                assert_eq!(detail, "Cannot delete tag used by 2 menu items")
            }
            other => panic!("unexpected body {other:?}"),
        }
    }
}
