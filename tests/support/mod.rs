#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tokio::sync::Mutex;
use tower::ServiceExt;

use taproom::application::{
    Repositories,
    auth::{AdminCredentials, SESSION_COOKIE_NAME, SessionManager},
    forms::{FormFields, FormKind, FormRelay, RelayOutcome},
    media::{DisabledMediaStore, MediaService},
    repos::{
        CategoryParams, EventParams, EventsRepo, EventsWriteRepo, HealthRepo, HolidayParams,
        InboxFilter, MenuItemFilter, MenuItemOrder, MenuItemParams, MenuRepo, MenuWriteRepo,
        MusicianRepo, NewMusicianApp, NewRental, RentalsRepo, RepoError, ReviewParams,
        ReviewsRepo, SiteRepo, SiteSettingsParams, TagParams,
    },
};
use taproom::domain::entities::{
    EventRecord, HolidayOverrideRecord, HoursRecord, MenuCategoryRecord, MenuItemRecord,
    MenuTagRecord, MusicianAppRecord, RentalRecord, ReviewRecord, SiteSettingsRecord,
};
use taproom::domain::types::{MusicianStatus, RentalStatus};
use taproom::infra::{
    http::{RouterState, build_router},
    uploads::LocalMediaStore,
};

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery";
const SECRET: &str = "integration-test-secret-key";
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Default)]
pub struct MemoryState {
    next_id: i64,
    pub categories: Vec<MenuCategoryRecord>,
    pub tags: Vec<MenuTagRecord>,
    pub items: Vec<MenuItemRecord>,
    pub events: Vec<EventRecord>,
    pub rentals: Vec<RentalRecord>,
    pub musicians: Vec<MusicianAppRecord>,
    pub reviews: Vec<ReviewRecord>,
    pub settings: Option<SiteSettingsRecord>,
    pub hours: Vec<HoursRecord>,
    pub holidays: Vec<HolidayOverrideRecord>,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Every repository trait over one mutex-guarded state.
#[derive(Default)]
pub struct MemoryRepo {
    pub state: Mutex<MemoryState>,
}

fn matches_text(haystack: &[Option<&str>], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    haystack
        .iter()
        .flatten()
        .any(|value| value.to_lowercase().contains(&needle))
}

#[async_trait]
impl MenuRepo for MemoryRepo {
    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError> {
        let mut categories = self.state.lock().await.categories.clone();
        categories.sort_by(|a, b| (a.sort_order, &a.name).cmp(&(b.sort_order, &b.name)));
        Ok(categories)
    }

    async fn find_category(&self, id: i64) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .categories
            .iter()
            .find(|c| Some(c.id) != exclude && (c.name == name || c.slug == slug))
            .cloned())
    }

    async fn count_category_usage(&self, id: i64) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|item| item.category_id == Some(id))
            .count() as u64)
    }

    async fn list_tags(&self) -> Result<Vec<MenuTagRecord>, RepoError> {
        let mut tags = self.state.lock().await.tags.clone();
        tags.sort_by(|a, b| (a.kind.as_str(), &a.name).cmp(&(b.kind.as_str(), &b.name)));
        Ok(tags)
    }

    async fn find_tag(&self, id: i64) -> Result<Option<MenuTagRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.tags.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tag_conflict(
        &self,
        name: &str,
        slug: &str,
        exclude: Option<i64>,
    ) -> Result<Option<MenuTagRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .tags
            .iter()
            .find(|t| Some(t.id) != exclude && (t.name == name || t.slug == slug))
            .cloned())
    }

    async fn count_tag_usage(&self, id: i64) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .items
            .iter()
            .filter(|item| item.tag_ids.contains(&id))
            .count() as u64)
    }

    async fn list_items(&self, filter: &MenuItemFilter) -> Result<Vec<MenuItemRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut items: Vec<MenuItemRecord> = state
            .items
            .iter()
            .filter(|item| !filter.available_only || item.available)
            .filter(|item| filter.category_id.is_none_or(|id| item.category_id == Some(id)))
            .filter(|item| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|needle| matches_text(&[Some(item.name.as_str())], needle))
            })
            .cloned()
            .collect();
        match filter.order {
            MenuItemOrder::Name => items.sort_by(|a, b| a.name.cmp(&b.name)),
            MenuItemOrder::FeaturedRank => items.sort_by(|a, b| {
                b.featured_rank
                    .cmp(&a.featured_rank)
                    .then_with(|| a.name.cmp(&b.name))
            }),
        }
        Ok(items)
    }

    async fn list_featured_items(&self, limit: u32) -> Result<Vec<MenuItemRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut items: Vec<MenuItemRecord> = state
            .items
            .iter()
            .filter(|item| item.available && item.featured_rank > 0)
            .cloned()
            .collect();
        items.sort_by_key(|item| item.featured_rank);
        items.truncate(limit as usize);
        Ok(items)
    }

    async fn find_item(&self, id: i64) -> Result<Option<MenuItemRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.items.iter().find(|item| item.id == id).cloned())
    }

    async fn count_items(&self) -> Result<u64, RepoError> {
        Ok(self.state.lock().await.items.len() as u64)
    }
}

#[async_trait]
impl MenuWriteRepo for MemoryRepo {
    async fn create_category(
        &self,
        params: CategoryParams,
    ) -> Result<MenuCategoryRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = MenuCategoryRecord {
            id: state.allocate_id(),
            name: params.name,
            slug: params.slug,
            sort_order: params.sort_order,
        };
        state.categories.push(record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        id: i64,
        params: CategoryParams,
    ) -> Result<MenuCategoryRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = state
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        record.name = params.name;
        record.slug = params.slug;
        record.sort_order = params.sort_order;
        Ok(record.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.categories.len();
        state.categories.retain(|c| c.id != id);
        if state.categories.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn create_tag(&self, params: TagParams) -> Result<MenuTagRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = MenuTagRecord {
            id: state.allocate_id(),
            name: params.name,
            slug: params.slug,
            kind: params.kind,
            icon: params.icon,
        };
        state.tags.push(record.clone());
        Ok(record)
    }

    async fn update_tag(&self, id: i64, params: TagParams) -> Result<MenuTagRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = state
            .tags
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepoError::NotFound)?;
        record.name = params.name;
        record.slug = params.slug;
        record.kind = params.kind;
        record.icon = params.icon;
        Ok(record.clone())
    }

    async fn delete_tag(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.tags.len();
        state.tags.retain(|t| t.id != id);
        if state.tags.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        let mut state = self.state.lock().await;
        let tag_ids = known_tags(&state, &params.tag_ids);
        let record = MenuItemRecord {
            id: state.allocate_id(),
            name: params.name,
            category_id: params.category_id,
            price_cents: params.price_cents,
            description: params.description,
            image_url: params.image_url,
            available: params.available,
            featured_rank: params.featured_rank,
            tag_ids,
        };
        state.items.push(record.clone());
        Ok(record)
    }

    async fn update_item(
        &self,
        id: i64,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        let mut state = self.state.lock().await;
        let tag_ids = known_tags(&state, &params.tag_ids);
        let record = state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepoError::NotFound)?;
        record.name = params.name;
        record.category_id = params.category_id;
        record.price_cents = params.price_cents;
        record.description = params.description;
        record.image_url = params.image_url;
        record.available = params.available;
        record.featured_rank = params.featured_rank;
        record.tag_ids = tag_ids;
        Ok(record.clone())
    }

    async fn set_item_available(&self, id: i64, available: bool) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepoError::NotFound)?;
        item.available = available;
        Ok(())
    }

    async fn set_featured_rank(&self, id: i64, rank: i32) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(RepoError::NotFound)?;
        item.featured_rank = rank;
        Ok(())
    }

    async fn replace_featured_order(&self, ids: &[i64]) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        for item in state.items.iter_mut() {
            item.featured_rank = ids
                .iter()
                .position(|id| *id == item.id)
                .map_or(0, |index| index as i32 + 1);
        }
        Ok(())
    }

    async fn delete_item(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.items.len();
        state.items.retain(|item| item.id != id);
        if state.items.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

fn known_tags(state: &MemoryState, ids: &[i64]) -> Vec<i64> {
    let mut tag_ids: Vec<i64> = ids
        .iter()
        .copied()
        .filter(|id| state.tags.iter().any(|tag| tag.id == *id))
        .collect();
    tag_ids.sort_unstable();
    tag_ids.dedup();
    tag_ids
}

fn event_from(id: i64, params: EventParams) -> EventRecord {
    EventRecord {
        id,
        title: params.title,
        starts_at: params.starts_at,
        ends_at: params.ends_at,
        description: params.description,
        image_url: params.image_url,
        venue_area: params.venue_area,
        is_published: params.is_published,
        ticket_url: params.ticket_url,
    }
}

#[async_trait]
impl EventsRepo for MemoryRepo {
    async fn list_events(&self) -> Result<Vec<EventRecord>, RepoError> {
        let mut events = self.state.lock().await.events.clone();
        events.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
        Ok(events)
    }

    async fn find_event(&self, id: i64) -> Result<Option<EventRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.events.iter().find(|event| event.id == id).cloned())
    }

    async fn list_upcoming(
        &self,
        from: PrimitiveDateTime,
        limit: u32,
    ) -> Result<Vec<EventRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut events: Vec<EventRecord> = state
            .events
            .iter()
            .filter(|event| event.is_published && event.starts_at >= from)
            .cloned()
            .collect();
        events.sort_by_key(|event| event.starts_at);
        events.truncate(limit as usize);
        Ok(events)
    }

    async fn list_in_range(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<EventRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut events: Vec<EventRecord> = state
            .events
            .iter()
            .filter(|event| {
                event.is_published
                    && event.starts_at <= end
                    && event.ends_at.unwrap_or(event.starts_at) >= start
            })
            .cloned()
            .collect();
        events.sort_by_key(|event| event.starts_at);
        Ok(events)
    }

    async fn count_upcoming(&self, from: PrimitiveDateTime) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state
            .events
            .iter()
            .filter(|event| event.is_published && event.starts_at >= from)
            .count() as u64)
    }
}

#[async_trait]
impl EventsWriteRepo for MemoryRepo {
    async fn create_event(&self, params: EventParams) -> Result<EventRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = event_from(state.allocate_id(), params);
        state.events.push(record.clone());
        Ok(record)
    }

    async fn update_event(&self, id: i64, params: EventParams) -> Result<EventRecord, RepoError> {
        let mut state = self.state.lock().await;
        let slot = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(RepoError::NotFound)?;
        *slot = event_from(id, params);
        Ok(slot.clone())
    }

    async fn set_event_published(&self, id: i64, published: bool) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let event = state
            .events
            .iter_mut()
            .find(|event| event.id == id)
            .ok_or(RepoError::NotFound)?;
        event.is_published = published;
        Ok(())
    }

    async fn delete_event(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.events.len();
        state.events.retain(|event| event.id != id);
        if state.events.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RentalsRepo for MemoryRepo {
    async fn list_rentals(
        &self,
        filter: &InboxFilter<RentalStatus>,
    ) -> Result<Vec<RentalRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut rows: Vec<RentalRecord> = state
            .rentals
            .iter()
            .filter(|row| filter.status.is_none_or(|status| row.status == status))
            .filter(|row| {
                filter
                    .venue_area
                    .as_deref()
                    .is_none_or(|area| row.venue_area.as_deref() == Some(area))
            })
            .filter(|row| {
                filter.search.as_deref().is_none_or(|needle| {
                    matches_text(
                        &[
                            Some(row.name.as_str()),
                            Some(row.email.as_str()),
                            row.message.as_deref(),
                        ],
                        needle,
                    )
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        rows.truncate(filter.limit as usize);
        Ok(rows)
    }

    async fn create_rental(&self, rental: NewRental) -> Result<RentalRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = RentalRecord {
            id: state.allocate_id(),
            name: rental.name,
            email: rental.email,
            phone: rental.phone,
            event_date: rental.event_date,
            package: rental.package,
            venue_area: rental.venue_area,
            party_size: rental.party_size,
            message: rental.message,
            submitted_at: OffsetDateTime::now_utc(),
            status: RentalStatus::New,
        };
        state.rentals.push(record.clone());
        Ok(record)
    }

    async fn set_rental_status(&self, id: i64, status: RentalStatus) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let row = state
            .rentals
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.status = status;
        Ok(())
    }

    async fn count_rentals_with_status(&self, status: RentalStatus) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state.rentals.iter().filter(|row| row.status == status).count() as u64)
    }
}

#[async_trait]
impl MusicianRepo for MemoryRepo {
    async fn list_applications(
        &self,
        filter: &InboxFilter<MusicianStatus>,
    ) -> Result<Vec<MusicianAppRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut rows: Vec<MusicianAppRecord> = state
            .musicians
            .iter()
            .filter(|row| filter.status.is_none_or(|status| row.status == status))
            .filter(|row| {
                filter.search.as_deref().is_none_or(|needle| {
                    matches_text(
                        &[
                            Some(row.name.as_str()),
                            Some(row.email.as_str()),
                            row.genre.as_deref(),
                        ],
                        needle,
                    )
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at).then(b.id.cmp(&a.id)));
        rows.truncate(filter.limit as usize);
        Ok(rows)
    }

    async fn create_application(
        &self,
        application: NewMusicianApp,
    ) -> Result<MusicianAppRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = MusicianAppRecord {
            id: state.allocate_id(),
            name: application.name,
            email: application.email,
            phone: application.phone,
            genre: application.genre,
            link: application.link,
            socials: application.socials,
            file_url: application.file_url,
            message: application.message,
            submitted_at: OffsetDateTime::now_utc(),
            status: MusicianStatus::New,
        };
        state.musicians.push(record.clone());
        Ok(record)
    }

    async fn set_application_status(
        &self,
        id: i64,
        status: MusicianStatus,
    ) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let row = state
            .musicians
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.status = status;
        Ok(())
    }

    async fn count_applications_with_status(
        &self,
        status: MusicianStatus,
    ) -> Result<u64, RepoError> {
        let state = self.state.lock().await;
        Ok(state.musicians.iter().filter(|row| row.status == status).count() as u64)
    }
}

#[async_trait]
impl ReviewsRepo for MemoryRepo {
    async fn list_featured_reviews(&self) -> Result<Vec<ReviewRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut rows: Vec<ReviewRecord> = state
            .reviews
            .iter()
            .filter(|row| row.is_featured)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn list_other_reviews(&self, limit: u32) -> Result<Vec<ReviewRecord>, RepoError> {
        let state = self.state.lock().await;
        let mut rows: Vec<ReviewRecord> = state
            .reviews
            .iter()
            .filter(|row| !row.is_featured)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn find_review(&self, id: i64) -> Result<Option<ReviewRecord>, RepoError> {
        let state = self.state.lock().await;
        Ok(state.reviews.iter().find(|row| row.id == id).cloned())
    }

    async fn create_review(&self, params: ReviewParams) -> Result<ReviewRecord, RepoError> {
        let mut state = self.state.lock().await;
        let record = ReviewRecord {
            id: state.allocate_id(),
            source: params.source,
            embed_code: params.embed_code,
            rating: params.rating,
            body: params.body,
            url: params.url,
            reviewer_name: params.reviewer_name,
            reviewer_avatar: params.reviewer_avatar,
            review_time: params.review_time,
            is_featured: params.is_featured,
        };
        state.reviews.push(record.clone());
        Ok(record)
    }

    async fn set_review_featured(&self, id: i64, featured: bool) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let row = state
            .reviews
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or(RepoError::NotFound)?;
        row.is_featured = featured;
        Ok(())
    }

    async fn delete_review(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.reviews.len();
        state.reviews.retain(|row| row.id != id);
        if state.reviews.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn count_reviews(&self) -> Result<u64, RepoError> {
        Ok(self.state.lock().await.reviews.len() as u64)
    }
}

#[async_trait]
impl SiteRepo for MemoryRepo {
    async fn load_site_settings(&self) -> Result<Option<SiteSettingsRecord>, RepoError> {
        Ok(self.state.lock().await.settings.clone())
    }

    async fn upsert_site_settings(
        &self,
        params: SiteSettingsParams,
    ) -> Result<SiteSettingsRecord, RepoError> {
        let record = SiteSettingsRecord {
            site_name: params.site_name,
            phone: params.phone,
            email: params.email,
            address: params.address,
            city: params.city,
            state: params.state,
            zip: params.zip,
            lat: params.lat,
            lng: params.lng,
            hero_title: params.hero_title,
            hero_sub: params.hero_sub,
            show_weather: params.show_weather,
            facebook: params.facebook,
            instagram: params.instagram,
            tiktok: params.tiktok,
            youtube: params.youtube,
            updated_at: OffsetDateTime::now_utc(),
        };
        self.state.lock().await.settings = Some(record.clone());
        Ok(record)
    }

    async fn list_hours(&self) -> Result<Vec<HoursRecord>, RepoError> {
        let mut hours = self.state.lock().await.hours.clone();
        hours.sort_by_key(|row| row.dow);
        Ok(hours)
    }

    async fn upsert_hours(&self, hours: HoursRecord) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        state.hours.retain(|row| row.dow != hours.dow);
        state.hours.push(hours);
        Ok(())
    }

    async fn list_holidays(&self) -> Result<Vec<HolidayOverrideRecord>, RepoError> {
        let mut holidays = self.state.lock().await.holidays.clone();
        holidays.sort_by_key(|row| row.date);
        Ok(holidays)
    }

    async fn upsert_holiday(
        &self,
        params: HolidayParams,
    ) -> Result<HolidayOverrideRecord, RepoError> {
        let mut state = self.state.lock().await;
        if let Some(existing) = state.holidays.iter_mut().find(|row| row.date == params.date) {
            existing.open_time = params.open_time;
            existing.close_time = params.close_time;
            existing.closed = params.closed;
            return Ok(existing.clone());
        }
        let record = HolidayOverrideRecord {
            id: state.allocate_id(),
            date: params.date,
            open_time: params.open_time,
            close_time: params.close_time,
            closed: params.closed,
        };
        state.holidays.push(record.clone());
        Ok(record)
    }

    async fn delete_holiday(&self, date: Date) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;
        let before = state.holidays.len();
        state.holidays.retain(|row| row.date != date);
        if state.holidays.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl HealthRepo for MemoryRepo {
    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Records every forwarded submission and reports it delivered.
#[derive(Default)]
pub struct RecordingRelay {
    pub sent: Mutex<Vec<(FormKind, FormFields)>>,
}

#[async_trait]
impl FormRelay for RecordingRelay {
    async fn forward(&self, kind: FormKind, fields: &FormFields) -> RelayOutcome {
        self.sent.lock().await.push((kind, fields.clone()));
        RelayOutcome::Delivered
    }
}

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<MemoryRepo>,
    pub relay: Arc<RecordingRelay>,
    pub sessions: Arc<SessionManager>,
}

impl TestApp {
    /// Router over in-memory repositories, with local media under `media_root`
    /// and cloud storage disabled.
    pub fn new(media_root: &Path) -> Self {
        let repo = Arc::new(MemoryRepo::default());
        let relay = Arc::new(RecordingRelay::default());
        let sessions = Arc::new(SessionManager::new(SECRET, false));
        let credentials = Arc::new(AdminCredentials::new(
            ADMIN_USER,
            None,
            Some(ADMIN_PASSWORD.to_string()),
        ));
        let local = Arc::new(
            LocalMediaStore::new(media_root.to_path_buf()).expect("create media root"),
        );
        let media = MediaService::new(Arc::new(DisabledMediaStore), local);

        let state = RouterState::new(
            &Repositories::from_shared(repo.clone()),
            media,
            relay.clone(),
            sessions.clone(),
            credentials,
            None,
        );

        Self {
            router: build_router(state, BODY_LIMIT),
            repo,
            relay,
            sessions,
        }
    }

    /// `Cookie` header value carrying a fresh admin session.
    pub fn session_cookie(&self) -> String {
        format!("{SESSION_COOKIE_NAME}={}", self.sessions.issue(ADMIN_USER))
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }
}

/// Count the files stored anywhere under `root`.
pub fn stored_files(root: &Path) -> usize {
    std::fs::read_dir(root)
        .expect("read media dir")
        .map(|entry| {
            let path = entry.expect("dir entry").path();
            if path.is_dir() {
                stored_files(&path)
            } else {
                1
            }
        })
        .sum()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).expect("json body")
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

pub fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub const BOUNDARY: &str = "taproom-test-boundary";

/// One part of a hand-built `multipart/form-data` body.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, cookie: Option<&str>, parts: &[Part<'_>]) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        format!("multipart/form-data; boundary={BOUNDARY}"),
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder
        .body(Body::from(multipart_body(parts)))
        .expect("request")
}
