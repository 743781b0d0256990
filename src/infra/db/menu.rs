use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};

use crate::{
    application::repos::{
        CategoryParams, MenuItemFilter, MenuItemOrder, MenuItemParams, MenuRepo, MenuWriteRepo,
        RepoError, TagParams,
    },
    domain::{
        entities::{MenuCategoryRecord, MenuItemRecord, MenuTagRecord},
        types::TagKind,
    },
};

use super::{PostgresRepositories, map_sqlx_error, util::like_pattern};

const ITEM_COLUMNS: &str = "id, name, category_id, price_cents, description, image_url, available, featured_rank";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    slug: String,
    sort_order: i32,
}

impl From<CategoryRow> for MenuCategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            sort_order: row.sort_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TagRow {
    id: i64,
    name: String,
    slug: String,
    kind: TagKind,
    icon: Option<String>,
}

impl From<TagRow> for MenuTagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            kind: row.kind,
            icon: row.icon,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    category_id: Option<i64>,
    price_cents: i64,
    description: Option<String>,
    image_url: Option<String>,
    available: bool,
    featured_rank: i32,
}

impl ItemRow {
    fn into_record(self, tag_ids: Vec<i64>) -> MenuItemRecord {
        MenuItemRecord {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
            price_cents: self.price_cents,
            description: self.description,
            image_url: self.image_url,
            available: self.available,
            featured_rank: self.featured_rank,
            tag_ids,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemTagRow {
    item_id: i64,
    tag_id: i64,
}

impl PostgresRepositories {
    /// Attach tag ids to a batch of item rows with one lookup.
    async fn attach_tags(&self, rows: Vec<ItemRow>) -> Result<Vec<MenuItemRecord>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let links = sqlx::query_as::<_, ItemTagRow>(
            "SELECT item_id, tag_id FROM menu_item_tags WHERE item_id = ANY($1) ORDER BY tag_id",
        )
        .bind(&ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let mut by_item: HashMap<i64, Vec<i64>> = HashMap::new();
        for link in links {
            by_item.entry(link.item_id).or_default().push(link.tag_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let tags = by_item.remove(&row.id).unwrap_or_default();
                row.into_record(tags)
            })
            .collect())
    }

    async fn link_tags(
        tx: &mut Transaction<'_, Postgres>,
        item_id: i64,
        tag_ids: &[i64],
    ) -> Result<Vec<i64>, RepoError> {
        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let linked: Vec<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO menu_item_tags (item_id, tag_id)
            SELECT $1, t.id FROM menu_tags t WHERE t.id = ANY($2)
            ON CONFLICT DO NOTHING
            RETURNING tag_id
            "#,
        )
        .bind(item_id)
        .bind(tag_ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(map_sqlx_error)?;

        let mut ids: Vec<i64> = linked.into_iter().map(|(id,)| id).collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl MenuRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, sort_order FROM menu_categories ORDER BY sort_order, name",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuCategoryRecord::from).collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, sort_order FROM menu_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuCategoryRecord::from))
    }

    async fn find_category_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, slug, sort_order
            FROM menu_categories
            WHERE (name = $1 OR slug = $2)
              AND ($3::BIGINT IS NULL OR id <> $3)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(exclude)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuCategoryRecord::from))
    }

    async fn count_category_usage(&self, id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items WHERE category_id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_tags(&self) -> Result<Vec<MenuTagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, slug, kind, icon FROM menu_tags ORDER BY kind, name",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuTagRecord::from).collect())
    }

    async fn find_tag(&self, id: i64) -> Result<Option<MenuTagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, slug, kind, icon FROM menu_tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuTagRecord::from))
    }

    async fn find_tag_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuTagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, slug, kind, icon
            FROM menu_tags
            WHERE (name = $1 OR slug = $2)
              AND ($3::BIGINT IS NULL OR id <> $3)
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(exclude)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuTagRecord::from))
    }

    async fn count_tag_usage(&self, id: i64) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_item_tags WHERE tag_id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }

    async fn list_items(&self, filter: &MenuItemFilter) -> Result<Vec<MenuItemRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(ITEM_COLUMNS);
        qb.push(" FROM menu_items WHERE 1 = 1");

        if let Some(search) = filter.search.as_deref() {
            qb.push(" AND name ILIKE ");
            qb.push_bind(like_pattern(search));
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND category_id = ");
            qb.push_bind(category_id);
        }
        if filter.available_only {
            qb.push(" AND available");
        }

        match filter.order {
            MenuItemOrder::Name => qb.push(" ORDER BY name, id"),
            MenuItemOrder::FeaturedRank => qb.push(" ORDER BY featured_rank DESC, name, id"),
        };

        let rows = qb
            .build_query_as::<ItemRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        self.attach_tags(rows).await
    }

    async fn list_featured_items(&self, limit: u32) -> Result<Vec<MenuItemRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items \
             WHERE available AND featured_rank > 0 \
             ORDER BY featured_rank, name LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        self.attach_tags(rows).await
    }

    async fn find_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM menu_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(self.attach_tags(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn count_items(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}

#[async_trait]
impl MenuWriteRepo for PostgresRepositories {
    async fn create_category(
        &self,
        params: CategoryParams,
    ) -> Result<MenuCategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO menu_categories (name, slug, sort_order)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, sort_order
            "#,
        )
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.sort_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<MenuCategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE menu_categories
            SET name = $2, slug = $3, sort_order = $4
            WHERE id = $1
            RETURNING id, name, slug, sort_order
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.sort_order)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(MenuCategoryRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menu_categories WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn create_tag(&self, params: TagParams) -> Result<MenuTagRecord, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO menu_tags (name, slug, kind, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, kind, icon
            "#,
        )
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.kind)
        .bind(&params.icon)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_tag(&self, id: i64, params: TagParams) -> Result<MenuTagRecord, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            UPDATE menu_tags
            SET name = $2, slug = $3, kind = $4, icon = $5
            WHERE id = $1
            RETURNING id, name, slug, kind, icon
            "#,
        )
        .bind(id)
        .bind(&params.name)
        .bind(&params.slug)
        .bind(params.kind)
        .bind(&params.icon)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(MenuTagRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_tag(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menu_tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "INSERT INTO menu_items \
                 (name, category_id, price_cents, description, image_url, available, featured_rank) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(&params.name)
        .bind(params.category_id)
        .bind(params.price_cents)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(params.available)
        .bind(params.featured_rank)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let tag_ids = Self::link_tags(&mut tx, row.id, &params.tag_ids).await?;
        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(row.into_record(tag_ids))
    }

    async fn update_item(
        &self,
        id: i64,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "UPDATE menu_items \
             SET name = $2, category_id = $3, price_cents = $4, description = $5, \
                 image_url = $6, available = $7, featured_rank = $8, updated_at = now() \
             WHERE id = $1 \
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.name)
        .bind(params.category_id)
        .bind(params.price_cents)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(params.available)
        .bind(params.featured_rank)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        sqlx::query("DELETE FROM menu_item_tags WHERE item_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let tag_ids = Self::link_tags(&mut tx, id, &params.tag_ids).await?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(row.into_record(tag_ids))
    }

    async fn set_item_available(&self, id: i64, available: bool) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE menu_items SET available = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(available)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn set_featured_rank(&self, id: i64, rank: i32) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE menu_items SET featured_rank = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(rank)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn replace_featured_order(&self, ids: &[i64]) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("UPDATE menu_items SET featured_rank = 0 WHERE featured_rank <> 0")
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        for (position, id) in ids.iter().enumerate() {
            let rank = i32::try_from(position + 1)
                .map_err(|_| RepoError::InvalidInput {
                    message: "too many featured items".to_string(),
                })?;
            sqlx::query("UPDATE menu_items SET featured_rank = $2 WHERE id = $1")
                .bind(id)
                .bind(rank)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn delete_item(&self, id: i64) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query("DELETE FROM menu_item_tags WHERE item_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let result = sqlx::query("DELETE FROM menu_items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())?;

        tx.commit().await.map_err(map_sqlx_error)
    }
}
