use std::sync::Arc;

use tracing::info;

use crate::application::admin::{AdminError, non_blank, not_found_as, require_text};
use crate::application::repos::{CategoryParams, MenuRepo, MenuWriteRepo, TagParams};
use crate::domain::entities::{MenuCategoryRecord, MenuTagRecord};
use crate::domain::menu::resolve_slug;
use crate::domain::types::TagKind;

const SOURCE: &str = "application::admin::taxonomy";

#[derive(Debug, Clone, Default)]
pub struct CategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TagInput {
    pub name: String,
    pub slug: Option<String>,
    pub kind: TagKind,
    pub icon: Option<String>,
}

/// Menu categories and tags, shared by the back office and the JSON API.
#[derive(Clone)]
pub struct AdminTaxonomyService {
    reader: Arc<dyn MenuRepo>,
    writer: Arc<dyn MenuWriteRepo>,
}

impl AdminTaxonomyService {
    pub fn new(reader: Arc<dyn MenuRepo>, writer: Arc<dyn MenuWriteRepo>) -> Self {
        Self { reader, writer }
    }

    pub async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, AdminError> {
        self.reader.list_categories().await.map_err(AdminError::from)
    }

    pub async fn create_category(
        &self,
        input: CategoryInput,
    ) -> Result<MenuCategoryRecord, AdminError> {
        let params = category_params(input)?;
        if self
            .reader
            .find_category_conflict(&params.name, &params.slug, None)
            .await?
            .is_some()
        {
            return Err(AdminError::Duplicate(
                "Category with same name or slug exists".to_string(),
            ));
        }

        let record = self.writer.create_category(params).await?;
        info!(target = SOURCE, id = record.id, slug = %record.slug, "category created");
        Ok(record)
    }

    pub async fn update_category(
        &self,
        id: i64,
        input: CategoryInput,
    ) -> Result<MenuCategoryRecord, AdminError> {
        self.require_category(id).await?;
        let params = category_params(input)?;
        if self
            .reader
            .find_category_conflict(&params.name, &params.slug, Some(id))
            .await?
            .is_some()
        {
            return Err(AdminError::Duplicate(
                "Category with same name or slug exists".to_string(),
            ));
        }

        self.writer
            .update_category(id, params)
            .await
            .map_err(not_found_as("category"))
    }

    /// Refuses while any menu item still points at the category.
    pub async fn delete_category(&self, id: i64) -> Result<(), AdminError> {
        self.require_category(id).await?;
        let count = self.reader.count_category_usage(id).await?;
        if count > 0 {
            return Err(AdminError::InUse {
                entity: "category",
                count,
            });
        }

        self.writer
            .delete_category(id)
            .await
            .map_err(not_found_as("category"))?;
        info!(target = SOURCE, id, "category deleted");
        Ok(())
    }

    pub async fn list_tags(&self) -> Result<Vec<MenuTagRecord>, AdminError> {
        self.reader.list_tags().await.map_err(AdminError::from)
    }

    pub async fn create_tag(&self, input: TagInput) -> Result<MenuTagRecord, AdminError> {
        let params = tag_params(input)?;
        if self
            .reader
            .find_tag_conflict(&params.name, &params.slug, None)
            .await?
            .is_some()
        {
            return Err(AdminError::Duplicate(
                "Tag with same name or slug exists".to_string(),
            ));
        }

        let record = self.writer.create_tag(params).await?;
        info!(target = SOURCE, id = record.id, slug = %record.slug, "tag created");
        Ok(record)
    }

    pub async fn update_tag(&self, id: i64, input: TagInput) -> Result<MenuTagRecord, AdminError> {
        self.require_tag(id).await?;
        let params = tag_params(input)?;
        if self
            .reader
            .find_tag_conflict(&params.name, &params.slug, Some(id))
            .await?
            .is_some()
        {
            return Err(AdminError::Duplicate(
                "Tag with same name or slug exists".to_string(),
            ));
        }

        self.writer
            .update_tag(id, params)
            .await
            .map_err(not_found_as("tag"))
    }

    /// Refuses while any menu item is linked to the tag; the tag row is left untouched.
    pub async fn delete_tag(&self, id: i64) -> Result<(), AdminError> {
        self.require_tag(id).await?;
        let count = self.reader.count_tag_usage(id).await?;
        if count > 0 {
            return Err(AdminError::InUse {
                entity: "tag",
                count,
            });
        }

        self.writer
            .delete_tag(id)
            .await
            .map_err(not_found_as("tag"))?;
        info!(target = SOURCE, id, "tag deleted");
        Ok(())
    }

    async fn require_category(&self, id: i64) -> Result<MenuCategoryRecord, AdminError> {
        self.reader
            .find_category(id)
            .await?
            .ok_or(AdminError::NotFound { entity: "category" })
    }

    async fn require_tag(&self, id: i64) -> Result<MenuTagRecord, AdminError> {
        self.reader
            .find_tag(id)
            .await?
            .ok_or(AdminError::NotFound { entity: "tag" })
    }
}

fn category_params(input: CategoryInput) -> Result<CategoryParams, AdminError> {
    let name = require_text(&input.name, "name")?;
    let slug = resolve_slug(&name, input.slug.as_deref())?;
    Ok(CategoryParams {
        name,
        slug,
        sort_order: input.sort_order,
    })
}

fn tag_params(input: TagInput) -> Result<TagParams, AdminError> {
    let name = require_text(&input.name, "name")?;
    let slug = resolve_slug(&name, input.slug.as_deref())?;
    Ok(TagParams {
        name,
        slug,
        kind: input.kind,
        icon: non_blank(input.icon),
    })
}
