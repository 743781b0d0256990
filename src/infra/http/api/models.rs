//! JSON payloads of the menu API.

use serde::{Deserialize, Serialize};

use crate::application::admin::{CategoryInput, MenuItemInput, TagInput};
use crate::domain::entities::{MenuCategoryRecord, MenuItemRecord, MenuTagRecord};
use crate::domain::error::DomainError;
use crate::domain::menu::{price_amount, price_cents_from_amount};
use crate::domain::types::TagKind;

#[derive(Debug, Deserialize)]
pub struct CategoryPayload {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl From<CategoryPayload> for CategoryInput {
    fn from(payload: CategoryPayload) -> Self {
        Self {
            name: payload.name,
            slug: payload.slug,
            sort_order: payload.sort_order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TagPayload {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: TagKind,
    #[serde(default)]
    pub icon: Option<String>,
}

impl From<TagPayload> for TagInput {
    fn from(payload: TagPayload) -> Self {
        Self {
            name: payload.name,
            slug: payload.slug,
            kind: payload.kind,
            icon: payload.icon,
        }
    }
}

/// Tag as exposed over JSON; the kind keeps its historical `type` key.
#[derive(Debug, Serialize)]
pub struct TagView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: TagKind,
    pub icon: Option<String>,
}

impl From<MenuTagRecord> for TagView {
    fn from(record: MenuTagRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            slug: record.slug,
            kind: record.kind,
            icon: record.icon,
        }
    }
}

pub type CategoryView = MenuCategoryRecord;

fn default_available() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct ItemPayload {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub featured_rank: i64,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl ItemPayload {
    /// Split into the service input and the externally supplied image URL.
    pub fn into_input(self) -> Result<(MenuItemInput, Option<String>), DomainError> {
        let input = MenuItemInput {
            name: self.name,
            category_id: self.category_id,
            price_cents: price_cents_from_amount(self.price)?,
            description: self.description,
            available: self.available,
            featured_rank: self.featured_rank,
            tag_ids: self.tag_ids,
        };
        Ok((input, self.image_url))
    }
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub available: bool,
    pub featured_rank: i32,
    pub tag_ids: Vec<i64>,
}

impl From<MenuItemRecord> for ItemView {
    fn from(record: MenuItemRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            price: price_amount(record.price_cents),
            description: record.description,
            image_url: record.image_url,
            category_id: record.category_id,
            available: record.available,
            featured_rank: record.featured_rank,
            tag_ids: record.tag_ids,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeaturedOrderResponse {
    pub ok: bool,
    pub set: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub ok: bool,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_payload_defaults_to_available() {
        let payload: ItemPayload =
            serde_json::from_str(r#"{"name":"Fries","price":4.5}"#).expect("payload");
        let (input, image) = payload.into_input().expect("input");
        assert!(input.available);
        assert_eq!(input.price_cents, 450);
        assert_eq!(input.featured_rank, 0);
        assert!(image.is_none());
    }

    #[test]
    fn tag_kind_uses_type_key() {
        let payload: TagPayload =
            serde_json::from_str(r#"{"name":"Hot","type":"spice"}"#).expect("payload");
        assert_eq!(payload.kind, TagKind::Spice);
    }
}
