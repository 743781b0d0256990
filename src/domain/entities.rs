//! Domain entities mirrored from persistent storage.

use serde::Serialize;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::domain::{
    datetime::{calendar_date, local_datetime},
    types::{MusicianStatus, RentalStatus, ReviewSource, TagKind, Weekday},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCategoryRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuTagRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub kind: TagKind,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItemRecord {
    pub id: i64,
    pub name: String,
    pub category_id: Option<i64>,
    pub price_cents: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub available: bool,
    pub featured_rank: i32,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    #[serde(with = "local_datetime")]
    pub starts_at: PrimitiveDateTime,
    #[serde(with = "local_datetime::option")]
    pub ends_at: Option<PrimitiveDateTime>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub venue_area: String,
    pub is_published: bool,
    pub ticket_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RentalRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(with = "local_datetime")]
    pub event_date: PrimitiveDateTime,
    pub package: Option<String>,
    pub venue_area: Option<String>,
    pub party_size: Option<i32>,
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    pub status: RentalStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicianAppRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub genre: Option<String>,
    pub link: Option<String>,
    pub socials: Option<serde_json::Value>,
    pub file_url: Option<String>,
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
    pub status: MusicianStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub id: i64,
    pub source: ReviewSource,
    pub embed_code: Option<String>,
    pub rating: i32,
    pub body: Option<String>,
    pub url: Option<String>,
    pub reviewer_name: Option<String>,
    pub reviewer_avatar: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub review_time: Option<OffsetDateTime>,
    pub is_featured: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSettingsRecord {
    pub site_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub hero_title: Option<String>,
    pub hero_sub: Option<String>,
    pub show_weather: bool,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub youtube: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoursRecord {
    pub dow: Weekday,
    pub open_time: String,
    pub close_time: String,
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayOverrideRecord {
    pub id: i64,
    #[serde(with = "calendar_date")]
    pub date: Date,
    pub open_time: String,
    pub close_time: String,
    pub closed: bool,
}
