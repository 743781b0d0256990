use async_trait::async_trait;
use time::{Date, OffsetDateTime};

use crate::{
    application::repos::{HolidayParams, RepoError, SiteRepo, SiteSettingsParams},
    domain::{
        entities::{HolidayOverrideRecord, HoursRecord, SiteSettingsRecord},
        types::Weekday,
    },
};

use super::{PostgresRepositories, map_sqlx_error};

const SETTINGS_COLUMNS: &str = "site_name, phone, email, address, city, state, zip, lat, lng, \
    hero_title, hero_sub, show_weather, facebook, instagram, tiktok, youtube, updated_at";

#[derive(sqlx::FromRow)]
struct SiteSettingsRow {
    site_name: String,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    hero_title: Option<String>,
    hero_sub: Option<String>,
    show_weather: bool,
    facebook: Option<String>,
    instagram: Option<String>,
    tiktok: Option<String>,
    youtube: Option<String>,
    updated_at: OffsetDateTime,
}

impl From<SiteSettingsRow> for SiteSettingsRecord {
    fn from(row: SiteSettingsRow) -> Self {
        Self {
            site_name: row.site_name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            city: row.city,
            state: row.state,
            zip: row.zip,
            lat: row.lat,
            lng: row.lng,
            hero_title: row.hero_title,
            hero_sub: row.hero_sub,
            show_weather: row.show_weather,
            facebook: row.facebook,
            instagram: row.instagram,
            tiktok: row.tiktok,
            youtube: row.youtube,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HoursRow {
    dow: Weekday,
    open_time: String,
    close_time: String,
    closed: bool,
}

impl From<HoursRow> for HoursRecord {
    fn from(row: HoursRow) -> Self {
        Self {
            dow: row.dow,
            open_time: row.open_time,
            close_time: row.close_time,
            closed: row.closed,
        }
    }
}

#[derive(sqlx::FromRow)]
struct HolidayRow {
    id: i64,
    date: Date,
    open_time: String,
    close_time: String,
    closed: bool,
}

impl From<HolidayRow> for HolidayOverrideRecord {
    fn from(row: HolidayRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            open_time: row.open_time,
            close_time: row.close_time,
            closed: row.closed,
        }
    }
}

#[async_trait]
impl SiteRepo for PostgresRepositories {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM site_settings WHERE id = 1"
        ))
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(SiteSettingsRecord::from))
    }

    async fn upsert_site_settings(
        &self,
        params: SiteSettingsParams,
    ) -> Result<SiteSettingsRecord, RepoError> {
        let row = sqlx::query_as::<_, SiteSettingsRow>(&format!(
            "INSERT INTO site_settings \
                 (id, site_name, phone, email, address, city, state, zip, lat, lng, \
                  hero_title, hero_sub, show_weather, facebook, instagram, tiktok, youtube) \
             VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             ON CONFLICT (id) DO UPDATE SET \
                 site_name = EXCLUDED.site_name, phone = EXCLUDED.phone, \
                 email = EXCLUDED.email, address = EXCLUDED.address, city = EXCLUDED.city, \
                 state = EXCLUDED.state, zip = EXCLUDED.zip, lat = EXCLUDED.lat, \
                 lng = EXCLUDED.lng, hero_title = EXCLUDED.hero_title, \
                 hero_sub = EXCLUDED.hero_sub, show_weather = EXCLUDED.show_weather, \
                 facebook = EXCLUDED.facebook, instagram = EXCLUDED.instagram, \
                 tiktok = EXCLUDED.tiktok, youtube = EXCLUDED.youtube, updated_at = now() \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(&params.site_name)
        .bind(&params.phone)
        .bind(&params.email)
        .bind(&params.address)
        .bind(&params.city)
        .bind(&params.state)
        .bind(&params.zip)
        .bind(params.lat)
        .bind(params.lng)
        .bind(&params.hero_title)
        .bind(&params.hero_sub)
        .bind(params.show_weather)
        .bind(&params.facebook)
        .bind(&params.instagram)
        .bind(&params.tiktok)
        .bind(&params.youtube)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn list_hours(&self) -> Result<Vec<HoursRecord>, RepoError> {
        let rows = sqlx::query_as::<_, HoursRow>(
            "SELECT dow, open_time, close_time, closed FROM hours ORDER BY dow",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(HoursRecord::from).collect())
    }

    async fn upsert_hours(&self, hours: HoursRecord) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO hours (dow, open_time, close_time, closed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (dow) DO UPDATE
            SET open_time = EXCLUDED.open_time,
                close_time = EXCLUDED.close_time,
                closed = EXCLUDED.closed
            "#,
        )
        .bind(hours.dow)
        .bind(&hours.open_time)
        .bind(&hours.close_time)
        .bind(hours.closed)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_holidays(&self) -> Result<Vec<HolidayOverrideRecord>, RepoError> {
        let rows = sqlx::query_as::<_, HolidayRow>(
            "SELECT id, date, open_time, close_time, closed FROM holiday_overrides ORDER BY date",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(HolidayOverrideRecord::from).collect())
    }

    async fn upsert_holiday(
        &self,
        params: HolidayParams,
    ) -> Result<HolidayOverrideRecord, RepoError> {
        let row = sqlx::query_as::<_, HolidayRow>(
            r#"
            INSERT INTO holiday_overrides (date, open_time, close_time, closed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (date) DO UPDATE
            SET open_time = EXCLUDED.open_time,
                close_time = EXCLUDED.close_time,
                closed = EXCLUDED.closed
            RETURNING id, date, open_time, close_time, closed
            "#,
        )
        .bind(params.date)
        .bind(&params.open_time)
        .bind(&params.close_time)
        .bind(params.closed)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_holiday(&self, date: Date) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM holiday_overrides WHERE date = $1")
            .bind(date)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::expect_affected(result.rows_affected())
    }
}
