use async_trait::async_trait;
use time::PrimitiveDateTime;

use crate::{
    application::repos::{EventParams, EventsRepo, EventsWriteRepo, RepoError},
    domain::entities::EventRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const EVENT_COLUMNS: &str =
    "id, title, starts_at, ends_at, description, image_url, venue_area, is_published, ticket_url";

#[derive(sqlx::FromRow)]
struct EventRow {
    id: i64,
    title: String,
    starts_at: PrimitiveDateTime,
    ends_at: Option<PrimitiveDateTime>,
    description: Option<String>,
    image_url: Option<String>,
    venue_area: String,
    is_published: bool,
    ticket_url: Option<String>,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            starts_at: row.starts_at,
            ends_at: row.ends_at,
            description: row.description,
            image_url: row.image_url,
            venue_area: row.venue_area,
            is_published: row.is_published,
            ticket_url: row.ticket_url,
        }
    }
}

#[async_trait]
impl EventsRepo for PostgresRepositories {
    async fn list_events(&self) -> Result<Vec<EventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY starts_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    async fn find_event(&self, id: i64) -> Result<Option<EventRecord>, RepoError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(EventRecord::from))
    }

    async fn list_upcoming(
        &self,
        from: PrimitiveDateTime,
        limit: u32,
    ) -> Result<Vec<EventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE is_published AND starts_at >= $1 \
             ORDER BY starts_at, id LIMIT $2"
        ))
        .bind(from)
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    async fn list_in_range(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<EventRecord>, RepoError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE is_published \
               AND COALESCE(ends_at, starts_at) >= $1 \
               AND starts_at <= $2 \
             ORDER BY starts_at, id"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(EventRecord::from).collect())
    }

    async fn count_upcoming(&self, from: PrimitiveDateTime) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM events WHERE is_published AND starts_at >= $1",
        )
        .bind(from)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}

#[async_trait]
impl EventsWriteRepo for PostgresRepositories {
    async fn create_event(&self, params: EventParams) -> Result<EventRecord, RepoError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events \
                 (title, starts_at, ends_at, description, image_url, venue_area, is_published, ticket_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&params.title)
        .bind(params.starts_at)
        .bind(params.ends_at)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(&params.venue_area)
        .bind(params.is_published)
        .bind(&params.ticket_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_event(&self, id: i64, params: EventParams) -> Result<EventRecord, RepoError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events \
             SET title = $2, starts_at = $3, ends_at = $4, description = $5, image_url = $6, \
                 venue_area = $7, is_published = $8, ticket_url = $9 \
             WHERE id = $1 \
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(id)
        .bind(&params.title)
        .bind(params.starts_at)
        .bind(params.ends_at)
        .bind(&params.description)
        .bind(&params.image_url)
        .bind(&params.venue_area)
        .bind(params.is_published)
        .bind(&params.ticket_url)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(EventRecord::from).ok_or(RepoError::NotFound)
    }

    async fn set_event_published(&self, id: i64, published: bool) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE events SET is_published = $2 WHERE id = $1")
            .bind(id)
            .bind(published)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn delete_event(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }
}
