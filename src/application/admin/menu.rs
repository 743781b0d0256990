use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::application::admin::{
    AdminError, discard_upload, non_blank, not_found_as, require_text,
};
use crate::application::media::{MediaService, UploadedFile};
use crate::application::repos::{
    MenuItemFilter, MenuItemOrder, MenuItemParams, MenuRepo, MenuWriteRepo,
};
use crate::domain::entities::{MenuCategoryRecord, MenuItemRecord, MenuTagRecord};
use crate::domain::menu::{FEATURED_ORDER_LIMIT, MAX_FEATURED_RANK, clamp_featured_rank};

const SOURCE: &str = "application::admin::menu";
const MEDIA_FOLDER: &str = "menu";

/// Fields shared by item create and update. The rank is clamped, not rejected.
#[derive(Debug, Clone, Default)]
pub struct MenuItemInput {
    pub name: String,
    pub category_id: Option<i64>,
    pub price_cents: i64,
    pub description: Option<String>,
    pub available: bool,
    pub featured_rank: i64,
    pub tag_ids: Vec<i64>,
}

/// What to do with an item's image on write.
#[derive(Debug, Clone)]
pub enum ImageChange<'a> {
    Keep,
    /// Store a new file. On success the previous asset is deleted; on failure the
    /// previous image stays.
    Upload(&'a UploadedFile),
    /// Point at an externally supplied URL (JSON API).
    Set(Option<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuScreen {
    pub search: Option<String>,
    pub items: Vec<MenuItemRecord>,
    pub categories: Vec<MenuCategoryRecord>,
    pub tags: Vec<MenuTagRecord>,
    pub featured: Vec<MenuItemRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuItemEditor {
    pub item: MenuItemRecord,
    pub categories: Vec<MenuCategoryRecord>,
    pub tags: Vec<MenuTagRecord>,
}

#[derive(Clone)]
pub struct AdminMenuService {
    reader: Arc<dyn MenuRepo>,
    writer: Arc<dyn MenuWriteRepo>,
    media: MediaService,
}

impl AdminMenuService {
    pub fn new(
        reader: Arc<dyn MenuRepo>,
        writer: Arc<dyn MenuWriteRepo>,
        media: MediaService,
    ) -> Self {
        Self {
            reader,
            writer,
            media,
        }
    }

    pub async fn screen(&self, search: Option<String>) -> Result<MenuScreen, AdminError> {
        let search = non_blank(search);
        let filter = MenuItemFilter {
            search: search.clone(),
            ..MenuItemFilter::default()
        };
        let items = self.reader.list_items(&filter).await?;
        let categories = self.reader.list_categories().await?;
        let tags = self.reader.list_tags().await?;
        let featured = self
            .reader
            .list_featured_items(MAX_FEATURED_RANK as u32)
            .await?;

        Ok(MenuScreen {
            search,
            items,
            categories,
            tags,
            featured,
        })
    }

    pub async fn editor(&self, id: i64) -> Result<MenuItemEditor, AdminError> {
        let item = self.require_item(id).await?;
        Ok(MenuItemEditor {
            item,
            categories: self.reader.list_categories().await?,
            tags: self.reader.list_tags().await?,
        })
    }

    /// Items for the JSON API: highest rank first, then name.
    pub async fn list_items(&self) -> Result<Vec<MenuItemRecord>, AdminError> {
        let filter = MenuItemFilter {
            order: MenuItemOrder::FeaturedRank,
            ..MenuItemFilter::default()
        };
        self.reader.list_items(&filter).await.map_err(AdminError::from)
    }

    pub async fn find_item(&self, id: i64) -> Result<MenuItemRecord, AdminError> {
        self.require_item(id).await
    }

    pub async fn create_item(
        &self,
        input: MenuItemInput,
        image: ImageChange<'_>,
    ) -> Result<MenuItemRecord, AdminError> {
        let mut params = self.item_params(input).await?;
        let mut uploaded = None;
        params.image_url = match image {
            ImageChange::Keep => None,
            ImageChange::Upload(file) => {
                uploaded = self.store_image(file).await;
                uploaded.clone()
            }
            ImageChange::Set(url) => non_blank(url),
        };

        let record = match self.writer.create_item(params).await {
            Ok(record) => record,
            Err(err) => {
                discard_upload(&self.media, uploaded).await;
                return Err(err.into());
            }
        };
        info!(
            target = SOURCE,
            id = record.id,
            rank = record.featured_rank,
            "menu item created"
        );
        Ok(record)
    }

    pub async fn update_item(
        &self,
        id: i64,
        input: MenuItemInput,
        image: ImageChange<'_>,
    ) -> Result<MenuItemRecord, AdminError> {
        let existing = self.require_item(id).await?;

        let mut params = self.item_params(input).await?;
        let mut uploaded = None;
        let image_url = match image {
            ImageChange::Keep => existing.image_url.clone(),
            ImageChange::Upload(file) => {
                uploaded = self.store_image(file).await;
                uploaded.clone().or_else(|| existing.image_url.clone())
            }
            ImageChange::Set(url) => non_blank(url),
        };
        params.image_url = image_url.clone();

        let record = match self.writer.update_item(id, params).await {
            Ok(record) => record,
            Err(err) => {
                discard_upload(&self.media, uploaded).await;
                return Err(not_found_as("menu item")(err));
            }
        };

        if let Some(previous) = existing.image_url.as_deref()
            && image_url.as_deref() != Some(previous)
        {
            self.media.delete(previous).await;
        }

        Ok(record)
    }

    /// Apply `(item id, rank)` pairs from the bulk ranking form. Unknown ids are skipped.
    pub async fn set_featured_ranks(&self, ranks: &[(i64, i64)]) -> Result<usize, AdminError> {
        let mut changed = 0;
        for &(id, rank) in ranks {
            if self.reader.find_item(id).await?.is_none() {
                continue;
            }
            self.writer
                .set_featured_rank(id, clamp_featured_rank(rank))
                .await?;
            changed += 1;
        }
        Ok(changed)
    }

    /// Clear every rank, then rank the first three ids 1, 2, 3.
    pub async fn replace_featured_order(&self, ids: &[i64]) -> Result<Vec<i64>, AdminError> {
        let selected: Vec<i64> = ids.iter().copied().take(FEATURED_ORDER_LIMIT).collect();
        self.writer.replace_featured_order(&selected).await?;
        Ok(selected)
    }

    /// Flip availability, returning the new value.
    pub async fn toggle_available(&self, id: i64) -> Result<bool, AdminError> {
        let item = self.require_item(id).await?;
        let available = !item.available;
        self.writer
            .set_item_available(id, available)
            .await
            .map_err(not_found_as("menu item"))?;
        Ok(available)
    }

    /// Remove the image, then the tag links and the item.
    pub async fn delete_item(&self, id: i64) -> Result<(), AdminError> {
        let item = self.require_item(id).await?;
        if let Some(url) = item.image_url.as_deref() {
            self.media.delete(url).await;
        }
        self.writer
            .delete_item(id)
            .await
            .map_err(not_found_as("menu item"))?;
        info!(target = SOURCE, id, "menu item deleted");
        Ok(())
    }

    async fn require_item(&self, id: i64) -> Result<MenuItemRecord, AdminError> {
        self.reader
            .find_item(id)
            .await?
            .ok_or(AdminError::NotFound {
                entity: "menu item",
            })
    }

    async fn store_image(&self, file: &UploadedFile) -> Option<String> {
        if file.is_blank() {
            return None;
        }
        let stored = self.media.upload(file, MEDIA_FOLDER).await;
        if stored.is_none() {
            warn!(
                target = SOURCE,
                file = %file.file_name,
                "image upload failed; saving menu item without a new image"
            );
        }
        stored
    }

    /// Validate the input. The image is attached after validation passes.
    async fn item_params(&self, input: MenuItemInput) -> Result<MenuItemParams, AdminError> {
        let name = require_text(&input.name, "name")?;
        if input.price_cents < 0 {
            return Err(AdminError::validation("price must not be negative"));
        }
        if let Some(category_id) = input.category_id
            && self.reader.find_category(category_id).await?.is_none()
        {
            return Err(AdminError::validation(format!(
                "unknown category {category_id}"
            )));
        }

        let mut tag_ids = input.tag_ids;
        tag_ids.sort_unstable();
        tag_ids.dedup();

        Ok(MenuItemParams {
            name,
            category_id: input.category_id,
            price_cents: input.price_cents,
            description: non_blank(input.description),
            image_url: None,
            available: input.available,
            featured_rank: clamp_featured_rank(input.featured_rank),
            tag_ids,
        })
    }
}
