use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;
use tracing::info;

use crate::application::{
    admin::{ImageChange, MenuItemInput, menu::MenuItemEditor, menu::MenuScreen},
    error::HttpError,
};
use crate::domain::menu::parse_price_cents;

use super::form::AdminForm;
use super::taxonomy::{category_input, tag_input};
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::menu";
const MENU_PATH: &str = "/admin/menu";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct MenuQuery {
    q: Option<String>,
}

pub(super) async fn admin_menu(
    State(state): State<AdminState>,
    Query(query): Query<MenuQuery>,
) -> Result<Json<MenuScreen>, HttpError> {
    state
        .menu
        .screen(query.q)
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_menu_edit(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Json<MenuItemEditor>, HttpError> {
    state
        .menu
        .editor(id)
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_menu_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = item_input(&form)?;
    let image = image_change(&form);
    state
        .menu
        .create_item(input, image)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

/// A blank file input keeps the current image.
pub(super) async fn admin_menu_update(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = item_input(&form)?;
    let image = image_change(&form);
    state
        .menu
        .update_item(id, input, image)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

/// Bulk ranking: every `rank_<id>` field sets that item's rank. Malformed ids or
/// ranks are skipped; a blank rank clears it.
pub(super) async fn admin_menu_feature(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let ranks = featured_ranks(&form);
    let changed = state
        .menu
        .set_featured_ranks(&ranks)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    info!(target = SOURCE, changed, "featured ranks updated");
    Ok(see_other(MENU_PATH))
}

pub(super) async fn admin_menu_toggle(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state
        .menu
        .toggle_available(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

pub(super) async fn admin_menu_delete(
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> Result<Response, HttpError> {
    state
        .menu
        .delete_item(id)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

pub(super) async fn admin_menu_category_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = category_input(&form)?;
    state
        .taxonomy
        .create_category(input)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

pub(super) async fn admin_menu_tag_create(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = tag_input(&form)?;
    state
        .taxonomy
        .create_tag(input)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(MENU_PATH))
}

fn item_input(form: &AdminForm) -> Result<MenuItemInput, HttpError> {
    let price_cents = parse_price_cents(form.required("price")?)
        .map_err(|err| admin_error_to_http(SOURCE, err.into()))?;

    Ok(MenuItemInput {
        name: form.text("name").unwrap_or_default().to_string(),
        category_id: form.integer("category_id")?,
        price_cents,
        description: form.owned("description"),
        available: form.checked("available"),
        featured_rank: form.integer("featured_rank")?.unwrap_or(0),
        tag_ids: form.integers("tag_ids"),
    })
}

fn image_change(form: &AdminForm) -> ImageChange<'_> {
    form.file("image")
        .map_or(ImageChange::Keep, ImageChange::Upload)
}

fn featured_ranks(form: &AdminForm) -> Vec<(i64, i64)> {
    form.with_prefix("rank_")
        .filter_map(|(id, rank)| {
            let id = id.parse().ok()?;
            let rank = match rank.trim() {
                "" => 0,
                raw => raw.parse().ok()?,
            };
            Some((id, rank))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_form_maps_checkbox_rank_and_tags() {
        let form = AdminForm::from_pairs(&[
            ("name", "Smash Burger"),
            ("price", "12.50"),
            ("category_id", "4"),
            ("featured_rank", "15"),
            ("tag_ids", "1"),
            ("tag_ids", "2"),
        ]);
        let input = item_input(&form).expect("valid form");
        assert_eq!(input.price_cents, 1250);
        assert_eq!(input.category_id, Some(4));
        assert!(!input.available);
        assert_eq!(input.featured_rank, 15);
        assert_eq!(input.tag_ids, vec![1, 2]);
    }

    #[test]
    fn missing_price_is_rejected() {
        let form = AdminForm::from_pairs(&[("name", "Fries")]);
        let err = item_input(&form).expect_err("price required");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn featured_form_skips_malformed_entries() {
        let form = AdminForm::from_pairs(&[
            ("rank_3", "2"),
            ("rank_x", "1"),
            ("rank_5", "high"),
            ("rank_8", ""),
            ("other", "1"),
        ]);
        assert_eq!(featured_ranks(&form), vec![(3, 2), (8, 0)]);
    }
}
