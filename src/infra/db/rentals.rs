use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::{OffsetDateTime, PrimitiveDateTime};

use crate::{
    application::repos::{InboxFilter, NewRental, RentalsRepo, RepoError},
    domain::{entities::RentalRecord, types::RentalStatus},
};

use super::{PostgresRepositories, map_sqlx_error, util::like_pattern};

const RENTAL_COLUMNS: &str = "id, name, email, phone, event_date, package, venue_area, party_size, message, submitted_at, status";

#[derive(sqlx::FromRow)]
struct RentalRow {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    event_date: PrimitiveDateTime,
    package: Option<String>,
    venue_area: Option<String>,
    party_size: Option<i32>,
    message: Option<String>,
    submitted_at: OffsetDateTime,
    status: RentalStatus,
}

impl From<RentalRow> for RentalRecord {
    fn from(row: RentalRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            event_date: row.event_date,
            package: row.package,
            venue_area: row.venue_area,
            party_size: row.party_size,
            message: row.message,
            submitted_at: row.submitted_at,
            status: row.status,
        }
    }
}

#[async_trait]
impl RentalsRepo for PostgresRepositories {
    async fn list_rentals(
        &self,
        filter: &InboxFilter<RentalStatus>,
    ) -> Result<Vec<RentalRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(RENTAL_COLUMNS);
        qb.push(" FROM rentals WHERE 1 = 1");

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }
        if let Some(area) = filter.venue_area.as_deref() {
            qb.push(" AND venue_area = ");
            qb.push_bind(area.to_string());
        }
        if let Some(search) = filter.search.as_deref() {
            let pattern = like_pattern(search);
            qb.push(" AND (name ILIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR email ILIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        qb.push(" ORDER BY event_date DESC, id DESC LIMIT ");
        qb.push_bind(i64::from(filter.limit));

        let rows = qb
            .build_query_as::<RentalRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(RentalRecord::from).collect())
    }

    async fn create_rental(&self, rental: NewRental) -> Result<RentalRecord, RepoError> {
        let row = sqlx::query_as::<_, RentalRow>(&format!(
            "INSERT INTO rentals \
                 (name, email, phone, event_date, package, venue_area, party_size, message) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {RENTAL_COLUMNS}"
        ))
        .bind(&rental.name)
        .bind(&rental.email)
        .bind(&rental.phone)
        .bind(rental.event_date)
        .bind(&rental.package)
        .bind(&rental.venue_area)
        .bind(rental.party_size)
        .bind(&rental.message)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_rental_status(&self, id: i64, status: RentalStatus) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE rentals SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }

    async fn count_rentals_with_status(&self, status: RentalStatus) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rentals WHERE status = $1")
            .bind(status)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(count)
    }
}
