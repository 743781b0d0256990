//! Process-local memoization of weekly hours and site settings.
//!
//! Each slot holds at most one value and never expires on its own; writers call
//! [`SiteCache::invalidate`] after mutating hours, holidays or settings. Loading runs
//! under the slot lock, so concurrent misses share a single query.

use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::repos::{RepoError, SiteRepo};
use crate::domain::entities::SiteSettingsRecord;
use crate::domain::hours::format_weekly_hours;

const SOURCE: &str = "application::site_cache";

/// Detached copy of the settings row handed to page assembly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteSettingsSnapshot {
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

impl SiteSettingsSnapshot {
    /// Street, city, state and zip joined for display and map queries.
    pub fn full_address(&self) -> Option<String> {
        let locality = [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let locality = match self.zip.as_deref().filter(|zip| !zip.trim().is_empty()) {
            Some(zip) if !locality.is_empty() => format!("{locality} {zip}"),
            Some(zip) => zip.to_string(),
            None => locality,
        };

        let parts: Vec<&str> = [self.address.as_deref(), Some(locality.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}

impl From<SiteSettingsRecord> for SiteSettingsSnapshot {
    fn from(record: SiteSettingsRecord) -> Self {
        Self {
            site_name: record.site_name,
            phone: record.phone,
            email: record.email,
            address: record.address,
            city: record.city,
            state: record.state,
            zip: record.zip,
            lat: record.lat,
            lng: record.lng,
            hero_title: record.hero_title,
            hero_sub: record.hero_sub,
            show_weather: record.show_weather,
            facebook: record.facebook,
            instagram: record.instagram,
            tiktok: record.tiktok,
            youtube: record.youtube,
        }
    }
}

/// `None` until loaded; a loaded slot may itself hold "absent".
type Slot<T> = Mutex<Option<Option<T>>>;

pub struct SiteCache {
    repo: Arc<dyn SiteRepo>,
    hours: Slot<Arc<str>>,
    settings: Slot<Arc<SiteSettingsSnapshot>>,
}

impl SiteCache {
    pub fn new(repo: Arc<dyn SiteRepo>) -> Self {
        Self {
            repo,
            hours: Mutex::new(None),
            settings: Mutex::new(None),
        }
    }

    /// Weekly hours formatted one day per line, Monday first. Absent when no rows exist.
    pub async fn get_hours(&self) -> Result<Option<Arc<str>>, RepoError> {
        let mut slot = self.hours.lock().await;
        if let Some(cached) = slot.as_ref() {
            counter!("taproom_site_cache_hit_total", "slot" => "hours").increment(1);
            return Ok(cached.clone());
        }

        counter!("taproom_site_cache_miss_total", "slot" => "hours").increment(1);
        let rows = self.repo.list_hours().await?;
        let formatted = format_weekly_hours(&rows).map(Arc::<str>::from);
        *slot = Some(formatted.clone());
        Ok(formatted)
    }

    pub async fn get_site_settings(&self) -> Result<Option<Arc<SiteSettingsSnapshot>>, RepoError> {
        let mut slot = self.settings.lock().await;
        if let Some(cached) = slot.as_ref() {
            counter!("taproom_site_cache_hit_total", "slot" => "settings").increment(1);
            return Ok(cached.clone());
        }

        counter!("taproom_site_cache_miss_total", "slot" => "settings").increment(1);
        let snapshot = self
            .repo
            .load_site_settings()
            .await?
            .map(|record| Arc::new(SiteSettingsSnapshot::from(record)));
        *slot = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Drop both memoized values; the next read queries again.
    pub async fn invalidate(&self) {
        *self.hours.lock().await = None;
        *self.settings.lock().await = None;
        counter!("taproom_site_cache_invalidate_total").increment(1);
        debug!(target = SOURCE, "site cache invalidated");
    }
}
