//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::{Date, PrimitiveDateTime};

use crate::domain::entities::{
    EventRecord, HolidayOverrideRecord, HoursRecord, MenuCategoryRecord, MenuItemRecord,
    MenuTagRecord, MusicianAppRecord, RentalRecord, ReviewRecord, SiteSettingsRecord,
};
use crate::domain::types::{MusicianStatus, RentalStatus, ReviewSource, TagKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryParams {
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagParams {
    pub name: String,
    pub slug: String,
    pub kind: TagKind,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemParams {
    pub name: String,
    pub category_id: Option<i64>,
    pub price_cents: i64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub available: bool,
    pub featured_rank: i32,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuItemOrder {
    /// Alphabetical, as shown on the menu page and the admin list.
    #[default]
    Name,
    /// Highest featured rank first, then name.
    FeaturedRank,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemFilter {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub available_only: bool,
    pub order: MenuItemOrder,
}

#[async_trait]
pub trait MenuRepo: Send + Sync {
    /// Categories ordered by `sort_order`, then name.
    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError>;

    async fn find_category(&self, id: i64) -> Result<Option<MenuCategoryRecord>, RepoError>;

    /// First category other than `exclude` whose name or slug collides.
    async fn find_category_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuCategoryRecord>, RepoError>;

    async fn count_category_usage(&self, id: i64) -> Result<u64, RepoError>;

    /// Tags ordered by kind, then name.
    async fn list_tags(&self) -> Result<Vec<MenuTagRecord>, RepoError>;

    async fn find_tag(&self, id: i64) -> Result<Option<MenuTagRecord>, RepoError>;

    async fn find_tag_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuTagRecord>, RepoError>;

    async fn count_tag_usage(&self, id: i64) -> Result<u64, RepoError>;

    async fn list_items(&self, filter: &MenuItemFilter) -> Result<Vec<MenuItemRecord>, RepoError>;

    /// Available items with a non-zero rank, lowest rank first.
    async fn list_featured_items(&self, limit: u32) -> Result<Vec<MenuItemRecord>, RepoError>;

    async fn find_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError>;

    async fn count_items(&self) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait MenuWriteRepo: Send + Sync {
    async fn create_category(&self, params: CategoryParams)
    -> Result<MenuCategoryRecord, RepoError>;

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<MenuCategoryRecord, RepoError>;

    async fn delete_category(&self, id: i64) -> Result<(), RepoError>;

    async fn create_tag(&self, params: TagParams) -> Result<MenuTagRecord, RepoError>;

    async fn update_tag(&self, id: i64, params: TagParams) -> Result<MenuTagRecord, RepoError>;

    async fn delete_tag(&self, id: i64) -> Result<(), RepoError>;

    /// Insert the item and its tag links. Unknown tag ids are ignored.
    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError>;

    /// Overwrite the item and replace its tag links.
    async fn update_item(&self, id: i64, params: MenuItemParams)
    -> Result<MenuItemRecord, RepoError>;

    async fn set_item_available(&self, id: i64, available: bool) -> Result<(), RepoError>;

    async fn set_featured_rank(&self, id: i64, rank: i32) -> Result<(), RepoError>;

    /// Reset every rank to zero, then rank the given ids 1.. in order.
    async fn replace_featured_order(&self, ids: &[i64]) -> Result<(), RepoError>;

    /// Remove the tag links, then the item.
    async fn delete_item(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventParams {
    pub title: String,
    pub starts_at: PrimitiveDateTime,
    pub ends_at: Option<PrimitiveDateTime>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub venue_area: String,
    pub is_published: bool,
    pub ticket_url: Option<String>,
}

#[async_trait]
pub trait EventsRepo: Send + Sync {
    /// Every event, latest start first.
    async fn list_events(&self) -> Result<Vec<EventRecord>, RepoError>;

    async fn find_event(&self, id: i64) -> Result<Option<EventRecord>, RepoError>;

    /// Published events starting at or after `from`, soonest first.
    async fn list_upcoming(
        &self,
        from: PrimitiveDateTime,
        limit: u32,
    ) -> Result<Vec<EventRecord>, RepoError>;

    /// Published events overlapping `[start, end]`, soonest first. An event without
    /// an end time occupies its start instant.
    async fn list_in_range(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<EventRecord>, RepoError>;

    async fn count_upcoming(&self, from: PrimitiveDateTime) -> Result<u64, RepoError>;
}

#[async_trait]
pub trait EventsWriteRepo: Send + Sync {
    async fn create_event(&self, params: EventParams) -> Result<EventRecord, RepoError>;

    async fn update_event(&self, id: i64, params: EventParams) -> Result<EventRecord, RepoError>;

    async fn set_event_published(&self, id: i64, published: bool) -> Result<(), RepoError>;

    async fn delete_event(&self, id: i64) -> Result<(), RepoError>;
}

#[derive(Debug, Clone, Default)]
pub struct InboxFilter<S> {
    pub status: Option<S>,
    pub venue_area: Option<String>,
    pub search: Option<String>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRental {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub event_date: PrimitiveDateTime,
    pub package: Option<String>,
    pub venue_area: Option<String>,
    pub party_size: Option<i32>,
    pub message: Option<String>,
}

#[async_trait]
pub trait RentalsRepo: Send + Sync {
    /// Newest event date first.
    async fn list_rentals(
        &self,
        filter: &InboxFilter<RentalStatus>,
    ) -> Result<Vec<RentalRecord>, RepoError>;

    async fn create_rental(&self, rental: NewRental) -> Result<RentalRecord, RepoError>;

    async fn set_rental_status(&self, id: i64, status: RentalStatus) -> Result<(), RepoError>;

    async fn count_rentals_with_status(&self, status: RentalStatus) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMusicianApp {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub genre: Option<String>,
    pub link: Option<String>,
    pub socials: Option<serde_json::Value>,
    pub file_url: Option<String>,
    pub message: Option<String>,
}

#[async_trait]
pub trait MusicianRepo: Send + Sync {
    /// Most recently submitted first.
    async fn list_applications(
        &self,
        filter: &InboxFilter<MusicianStatus>,
    ) -> Result<Vec<MusicianAppRecord>, RepoError>;

    async fn create_application(
        &self,
        application: NewMusicianApp,
    ) -> Result<MusicianAppRecord, RepoError>;

    async fn set_application_status(
        &self,
        id: i64,
        status: MusicianStatus,
    ) -> Result<(), RepoError>;

    async fn count_applications_with_status(
        &self,
        status: MusicianStatus,
    ) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewParams {
    pub source: ReviewSource,
    pub embed_code: Option<String>,
    pub rating: i32,
    pub body: Option<String>,
    pub url: Option<String>,
    pub reviewer_name: Option<String>,
    pub reviewer_avatar: Option<String>,
    pub review_time: Option<time::OffsetDateTime>,
    pub is_featured: bool,
}

#[async_trait]
pub trait ReviewsRepo: Send + Sync {
    /// Featured reviews, newest first.
    async fn list_featured_reviews(&self) -> Result<Vec<ReviewRecord>, RepoError>;

    /// Non-featured reviews, newest first.
    async fn list_other_reviews(&self, limit: u32) -> Result<Vec<ReviewRecord>, RepoError>;

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError>;

    async fn create_review(&self, params: ReviewParams) -> Result<ReviewRecord, RepoError>;

    async fn set_review_featured(&self, id: i64, featured: bool) -> Result<(), RepoError>;

    async fn delete_review(&self, id: i64) -> Result<(), RepoError>;

    async fn count_reviews(&self) -> Result<u64, RepoError>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SiteSettingsParams {
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
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayParams {
    pub date: Date,
    pub open_time: String,
    pub close_time: String,
    pub closed: bool,
}

#[async_trait]
pub trait SiteRepo: Send + Sync {
    /// The single settings row, if it has been created.
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError>;

    /// Insert or overwrite the single settings row.
    async fn upsert_site_settings(
        &self,
        params: SiteSettingsParams,
    ) -> Result<SiteSettingsRecord, RepoError>;

    async fn list_hours(&self) -> Result<Vec<HoursRecord>, RepoError>;

    async fn upsert_hours(&self, hours: HoursRecord) -> Result<(), RepoError>;

    /// Holiday overrides, soonest date first.
    async fn list_holidays(&self) -> Result<Vec<HolidayOverrideRecord>, RepoError>;

    async fn upsert_holiday(&self, params: HolidayParams)
    -> Result<HolidayOverrideRecord, RepoError>;

    async fn delete_holiday(&self, date: Date) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
