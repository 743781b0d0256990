use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;

use crate::{
    application::repos::{InboxFilter, MusicianRepo, NewMusicianApp, RepoError},
    domain::{entities::MusicianAppRecord, types::MusicianStatus},
};

use super::{PostgresRepositories, map_sqlx_error, util::like_pattern};

const APP_COLUMNS: &str =
    "id, name, email, phone, genre, link, socials, file_url, message, submitted_at, status";

#[derive(sqlx::FromRow)]
struct MusicianAppRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    genre: Option<String>,
    link: Option<String>,
    socials: Option<Value>,
    file_url: Option<String>,
    message: Option<String>,
    submitted_at: OffsetDateTime,
    status: MusicianStatus,
}

impl From<MusicianAppRow> for MusicianAppRecord {
    fn from(row: MusicianAppRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            genre: row.genre,
            link: row.link,
            socials: row.socials,
            file_url: row.file_url,
            message: row.message,
            submitted_at: row.submitted_at,
            status: row.status,
        }
    }
}

#[async_trait]
impl MusicianRepo for PostgresRepositories {
    async fn list_applications(
        &self,
        filter: &InboxFilter<MusicianStatus>,
    ) -> Result<Vec<MusicianAppRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(APP_COLUMNS);
        qb.push(" FROM musician_apps WHERE 1 = 1");

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR genre ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY submitted_at DESC, id DESC LIMIT ");
        qb.push_bind(i64::from(filter.limit));

        let rows = qb
            .build_query_as::<MusicianAppRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MusicianAppRecord::from).collect())
    }

    async fn create_application(
        &self,
        application: NewMusicianApp,
    ) -> Result<MusicianAppRecord, RepoError> {
        let row = sqlx::query_as::<_, MusicianAppRow>(&format!(
            "INSERT INTO musician_apps \
                 (name, email, phone, genre, link, socials, file_url, message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {APP_COLUMNS}"
        ))
        .bind(&application.name)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.genre)
        .bind(&application.link)
        .bind(&application.socials)
        .bind(&application.file_url)
        .bind(&application.message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_application_status(
        &self,
        id: i64,
        status: MusicianStatus,
    ) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE musician_apps SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn count_applications_with_status(
        &self,
        status: MusicianStatus,
    ) -> Result<u64, RepoError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM musician_apps WHERE status = $1")
                .bind(status)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}
