use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::Response,
};

use crate::application::{
    admin::{ReviewInput, reviews::ReviewsScreen},
    error::HttpError,
};
use crate::domain::datetime::parse_local_datetime;
use crate::domain::types::ReviewSource;

use super::form::AdminForm;
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::reviews";
const REVIEWS_PATH: &str = "/admin/reviews";
const DEFAULT_RATING: i64 = 5;

pub(super) async fn admin_reviews(
    State(state): State<AdminState>,
) -> Result<Json<ReviewsScreen>, HttpError> {
    state
        .reviews
        .screen()
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_review_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    state
        .reviews
        .create(review_input(&form)?)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(REVIEWS_PATH))
}

pub(super) async fn admin_review_feature(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let id = form.required_id("id")?;
    state
        .reviews
        .toggle_featured(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(REVIEWS_PATH))
}

pub(super) async fn admin_review_delete(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let id = form.required_id("id")?;
    state
        .reviews
        .delete(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(REVIEWS_PATH))
}

/// `review_time`, when given, is a wall-clock value taken as UTC.
fn review_input(form: &AdminForm) -> Result<ReviewInput, HttpError> {
    let source = form
        .required("source")?
        .parse::<ReviewSource>()
        .map_err(|err| admin_error_to_http(SOURCE, err.into()))?;

    let rating = form.integer("rating")?.unwrap_or(DEFAULT_RATING);
    let rating = i32::try_from(rating).map_err(|_| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "rating must be between 1 and 5",
            format!("rating = {rating}"),
        )
    })?;

    let review_time = match form.text("review_time").map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse_local_datetime(raw)
                .map_err(|err| admin_error_to_http(SOURCE, err.into()))?
                .assume_utc(),
        ),
    };

    Ok(ReviewInput {
        source,
        rating,
        body: form.owned("text"),
        url: form.owned("url"),
        reviewer_name: form.owned("reviewer_name"),
        reviewer_avatar: form.owned("reviewer_avatar"),
        embed_code: form.owned("embed_code"),
        review_time,
        is_featured: form.checked("is_featured"),
    })
}
