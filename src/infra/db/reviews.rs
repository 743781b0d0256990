use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, ReviewParams, ReviewsRepo},
    domain::{entities::ReviewRecord, types::ReviewSource},
};

use super::{PostgresRepositories, map_sqlx_error};

const REVIEW_COLUMNS: &str = "id, source, embed_code, rating, body, url, reviewer_name, reviewer_avatar, review_time, is_featured";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    source: ReviewSource,
    embed_code: Option<String>,
    rating: i32,
    body: Option<String>,
    url: Option<String>,
    reviewer_name: Option<String>,
    reviewer_avatar: Option<String>,
    review_time: Option<OffsetDateTime>,
    is_featured: bool,
}

impl From<ReviewRow> for ReviewRecord {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            source: row.source,
            embed_code: row.embed_code,
            rating: row.rating,
            body: row.body,
            url: row.url,
            reviewer_name: row.reviewer_name,
            reviewer_avatar: row.reviewer_avatar,
            review_time: row.review_time,
            is_featured: row.is_featured,
        }
    }
}

#[async_trait]
impl ReviewsRepo for PostgresRepositories {
    async fn list_featured_reviews(&self) -> Result<Vec<ReviewRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE is_featured ORDER BY id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn list_other_reviews(&self, limit: u32) -> Result<Vec<ReviewRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE NOT is_featured \
             ORDER BY id DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(ReviewRecord::from).collect())
    }

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ReviewRecord::from))
    }

    async fn create_review(&self, params: ReviewParams) -> Result<ReviewRecord, RepoError> {
        let row = sqlx::query_as::<_, ReviewRow>(&format!(
            "INSERT INTO reviews \
                 (source, embed_code, rating, body, url, reviewer_name, reviewer_avatar, review_time, is_featured) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {REVIEW_COLUMNS}"
        ))
        .bind(params.source)
        .bind(&params.embed_code)
        .bind(params.rating)
        .bind(&params.body)
        .bind(&params.url)
        .bind(&params.reviewer_name)
        .bind(&params.reviewer_avatar)
        .bind(params.review_time)
        .bind(params.is_featured)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_review_featured(&self, id: i64, featured: bool) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE reviews SET is_featured = $2 WHERE id = $1")
            .bind(id)
            .bind(featured)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn delete_review(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn count_reviews(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}
