use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::application::admin::{AdminError, ImageChange};

use super::ApiState;
use super::error::ApiError;
use super::models::{
    CategoryPayload, CategoryView, FeaturedOrderResponse, ItemPayload, ItemView, TagPayload,
    TagView,
};

pub async fn list_categories(
    State(state): State<ApiState>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    Ok(Json(state.taxonomy.list_categories().await?))
}

pub async fn create_category(
    State(state): State<ApiState>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.taxonomy.create_category(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.taxonomy.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_tags(State(state): State<ApiState>) -> Result<Json<Vec<TagView>>, ApiError> {
    let tags = state.taxonomy.list_tags().await?;
    Ok(Json(tags.into_iter().map(TagView::from).collect()))
}

pub async fn create_tag(
    State(state): State<ApiState>,
    Json(payload): Json<TagPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state.taxonomy.create_tag(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(TagView::from(record))))
}

pub async fn delete_tag(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.taxonomy.delete_tag(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_items(State(state): State<ApiState>) -> Result<Json<Vec<ItemView>>, ApiError> {
    let items = state.menu.list_items().await?;
    Ok(Json(items.into_iter().map(ItemView::from).collect()))
}

pub async fn create_item(
    State(state): State<ApiState>,
    Json(payload): Json<ItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let (input, image_url) = payload.into_input().map_err(AdminError::from)?;
    let record = state
        .menu
        .create_item(input, ImageChange::Set(image_url))
        .await?;
    Ok((StatusCode::CREATED, Json(ItemView::from(record))))
}

/// Full replacement: every field, the tag set and the image URL come from the payload.
pub async fn update_item(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<ItemView>, ApiError> {
    let (input, image_url) = payload.into_input().map_err(AdminError::from)?;
    let record = state
        .menu
        .update_item(id, input, ImageChange::Set(image_url))
        .await?;
    Ok(Json(ItemView::from(record)))
}

pub async fn delete_item(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.menu.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rank the first three ids 1..=3 after clearing every other rank.
pub async fn set_featured_order(
    State(state): State<ApiState>,
    Json(ids): Json<Vec<i64>>,
) -> Result<Json<FeaturedOrderResponse>, ApiError> {
    let set = state.menu.replace_featured_order(&ids).await?;
    Ok(Json(FeaturedOrderResponse { ok: true, set }))
}
