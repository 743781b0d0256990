//! Site settings, weekly hours and holiday overrides.
//!
//! Every successful write clears the site cache so public pages see the change on
//! their next read.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::application::admin::{AdminError, non_blank};
use crate::application::repos::{HolidayParams, RepoError, SiteRepo, SiteSettingsParams};
use crate::application::site_cache::SiteCache;
use crate::domain::datetime::parse_calendar_date;
use crate::domain::entities::{HolidayOverrideRecord, HoursRecord, SiteSettingsRecord};
use crate::domain::hours::normalize_clock;
use crate::domain::types::Weekday;

const SOURCE: &str = "application::admin::site";

pub const DEFAULT_SITE_NAME: &str = "Taproom";

/// Values posted by the basic settings form. Blank name and hero fields keep
/// their stored values; the rest are overwritten.
#[derive(Debug, Clone, Default)]
pub struct SiteBasicInput {
    pub site_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub hero_title: Option<String>,
    pub hero_sub: Option<String>,
    pub show_weather: bool,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
    pub youtube: Option<String>,
}

/// Opening window for a weekday or a holiday date, as posted by the settings forms.
#[derive(Debug, Clone, Default)]
pub struct TimeSlotInput {
    pub key: String,
    pub open: String,
    pub close: String,
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteScreen {
    pub settings: Option<SiteSettingsRecord>,
    pub hours: Vec<HoursRecord>,
    pub holidays: Vec<HolidayOverrideRecord>,
}

#[derive(Clone)]
pub struct AdminSiteService {
    repo: Arc<dyn SiteRepo>,
    cache: Arc<SiteCache>,
}

impl AdminSiteService {
    pub fn new(repo: Arc<dyn SiteRepo>, cache: Arc<SiteCache>) -> Self {
        Self { repo, cache }
    }

    /// Settings row, one hours row per weekday (blank where none is stored) and holidays.
    pub async fn screen(&self) -> Result<SiteScreen, AdminError> {
        let settings = self.repo.load_site_settings().await?;
        let stored = self.repo.list_hours().await?;
        let hours = Weekday::ALL
            .iter()
            .map(|dow| {
                stored
                    .iter()
                    .find(|row| row.dow == *dow)
                    .cloned()
                    .unwrap_or_else(|| HoursRecord {
                        dow: *dow,
                        open_time: String::new(),
                        close_time: String::new(),
                        closed: false,
                    })
            })
            .collect();
        let holidays = self.repo.list_holidays().await?;

        Ok(SiteScreen {
            settings,
            hours,
            holidays,
        })
    }

    pub async fn update_basic(&self, input: SiteBasicInput) -> Result<SiteSettingsRecord, AdminError> {
        let existing = self.repo.load_site_settings().await?;
        let params = SiteSettingsParams {
            site_name: non_blank(input.site_name)
                .or_else(|| existing.as_ref().map(|record| record.site_name.clone()))
                .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string()),
            phone: non_blank(input.phone),
            email: non_blank(input.email),
            address: non_blank(input.address),
            city: non_blank(input.city),
            state: non_blank(input.state),
            zip: non_blank(input.zip),
            lat: existing.as_ref().and_then(|record| record.lat),
            lng: existing.as_ref().and_then(|record| record.lng),
            hero_title: non_blank(input.hero_title)
                .or_else(|| existing.as_ref().and_then(|record| record.hero_title.clone())),
            hero_sub: non_blank(input.hero_sub)
                .or_else(|| existing.as_ref().and_then(|record| record.hero_sub.clone())),
            show_weather: input.show_weather,
            facebook: non_blank(input.facebook),
            instagram: non_blank(input.instagram),
            tiktok: non_blank(input.tiktok),
            youtube: non_blank(input.youtube),
        };

        let record = self.repo.upsert_site_settings(params).await?;
        self.cache.invalidate().await;
        info!(target = SOURCE, "site settings updated");
        Ok(record)
    }

    /// Upsert the row for one weekday (`mon`..`sun`).
    pub async fn set_hours(&self, input: TimeSlotInput) -> Result<HoursRecord, AdminError> {
        let dow: Weekday = input.key.parse()?;
        let row = HoursRecord {
            dow,
            open_time: normalize_clock(&input.open)?,
            close_time: normalize_clock(&input.close)?,
            closed: input.closed,
        };
        self.repo.upsert_hours(row.clone()).await?;
        self.cache.invalidate().await;
        info!(target = SOURCE, dow = %dow, "weekly hours updated");
        Ok(row)
    }

    /// Upsert the override for one `YYYY-MM-DD` date.
    pub async fn set_holiday(&self, input: TimeSlotInput) -> Result<HolidayOverrideRecord, AdminError> {
        let params = HolidayParams {
            date: parse_calendar_date(&input.key)?,
            open_time: normalize_clock(&input.open)?,
            close_time: normalize_clock(&input.close)?,
            closed: input.closed,
        };
        let record = self.repo.upsert_holiday(params).await?;
        self.cache.invalidate().await;
        info!(target = SOURCE, id = record.id, "holiday override saved");
        Ok(record)
    }

    /// Remove the override for a date. A date without an override is left as is.
    pub async fn delete_holiday(&self, date: &str) -> Result<(), AdminError> {
        let date = parse_calendar_date(date)?;
        match self.repo.delete_holiday(date).await {
            Ok(()) | Err(RepoError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }
        self.cache.invalidate().await;
        Ok(())
    }

    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
        info!(target = SOURCE, "site cache cleared on request");
    }
}
