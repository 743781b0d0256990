use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Response,
};

use crate::application::{
    admin::{CategoryInput, TagInput},
    error::HttpError,
};
use crate::domain::entities::{MenuCategoryRecord, MenuTagRecord};
use crate::domain::types::TagKind;

use super::form::AdminForm;
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::taxonomy";
const CATEGORIES_PATH: &str = "/admin/categories";
const TAGS_PATH: &str = "/admin/tags";

pub(super) async fn admin_categories(
    State(state): State<AdminState>,
) -> Result<Json<Vec<MenuCategoryRecord>>, HttpError> {
    state
        .taxonomy
        .list_categories()
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_category_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .create_category(category_input(&form)?)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(CATEGORIES_PATH))
}

pub(super) async fn admin_category_update(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .update_category(id, category_input(&form)?)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(CATEGORIES_PATH))
}

pub(super) async fn admin_category_delete(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .delete_category(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(CATEGORIES_PATH))
}

pub(super) async fn admin_tags(
    State(state): State<AdminState>,
) -> Result<Json<Vec<MenuTagRecord>>, HttpError> {
    state
        .taxonomy
        .list_tags()
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_tag_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .create_tag(tag_input(&form)?)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(TAGS_PATH))
}

pub(super) async fn admin_tag_update(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .update_tag(id, tag_input(&form)?)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(TAGS_PATH))
}

/// Refused with 400 while any menu item carries the tag.
pub(super) async fn admin_tag_delete(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state
        .taxonomy
        .delete_tag(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(TAGS_PATH))
}

pub(super) fn category_input(form: &AdminForm) -> Result<CategoryInput, HttpError> {
    let sort_order = form.integer("sort_order")?.unwrap_or(0);
    let sort_order = i32::try_from(sort_order).map_err(|_| {
        HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "sort_order is out of range",
            format!("sort_order = {sort_order}"),
        )
    })?;

    Ok(CategoryInput {
        name: form.text("name").unwrap_or_default().to_string(),
        slug: form.owned("slug"),
        sort_order,
    })
}

/// The tag type defaults to dietary when the select is omitted.
pub(super) fn tag_input(form: &AdminForm) -> Result<TagInput, HttpError> {
    let kind = match form.text("type").map(str::trim) {
        None | Some("") => TagKind::default(),
        Some(raw) => raw
            .parse::<TagKind>()
            .map_err(|err| admin_error_to_http(SOURCE, err.into()))?,
    };

    Ok(TagInput {
        name: form.text("name").unwrap_or_default().to_string(),
        slug: form.owned("slug"),
        kind,
        icon: form.owned("icon"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_type_defaults_to_dietary() {
        let form = AdminForm::from_pairs(&[("name", "Vegan"), ("slug", "vegan")]);
        let input = tag_input(&form).expect("valid");
        assert_eq!(input.kind, TagKind::Dietary);
        assert_eq!(input.slug.as_deref(), Some("vegan"));
    }

    #[test]
    fn unknown_tag_type_is_rejected() {
        let form = AdminForm::from_pairs(&[("name", "Hot"), ("type", "volcanic")]);
        let err = tag_input(&form).expect_err("unknown type");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn category_sort_order_defaults_to_zero() {
        let form = AdminForm::from_pairs(&[("name", "Mains"), ("sort_order", "")]);
        assert_eq!(category_input(&form).expect("valid").sort_order, 0);
    }
}
