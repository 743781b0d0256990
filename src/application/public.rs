//! Assembly of the public page payloads.
//!
//! Home and the shared page chrome favour availability: a failing section is
//! logged and rendered empty. The menu, reviews and event feeds propagate
//! repository failures so the handler can answer with an error status.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use time::PrimitiveDateTime;
use tracing::warn;

use crate::application::repos::{EventsRepo, MenuItemFilter, MenuRepo, RepoError, ReviewsRepo};
use crate::application::site_cache::{SiteCache, SiteSettingsSnapshot};
use crate::domain::datetime::{local_datetime, now_local};
use crate::domain::entities::{
    EventRecord, MenuCategoryRecord, MenuItemRecord, MenuTagRecord, ReviewRecord,
};
use crate::domain::menu::price_amount;
use crate::domain::types::TagKind;

const SOURCE: &str = "application::public";

pub const HOME_FEATURED_LIMIT: u32 = 3;
pub const HOME_EVENTS_LIMIT: u32 = 3;
pub const UPCOMING_EVENTS_LIMIT: u32 = 6;
pub const REVIEWS_OTHER_LIMIT: u32 = 30;
pub const PLACEHOLDER_IMAGE: &str = "/assets/images/placeholders/dish-1.jpg";
const UNCATEGORIZED: &str = "other";

#[derive(Debug, Error)]
pub enum PublicError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Settings and hours shown in every public page header and footer.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteChrome {
    pub settings: Option<Arc<SiteSettingsSnapshot>>,
    pub hours: Option<Arc<str>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuCard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub img: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryChip {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TagChip {
    pub slug: String,
    pub name: String,
    pub kind: TagKind,
    pub icon: Option<String>,
}

impl From<MenuTagRecord> for TagChip {
    fn from(tag: MenuTagRecord) -> Self {
        Self {
            slug: tag.slug,
            name: tag.name,
            kind: tag.kind,
            icon: tag.icon,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    #[serde(flatten)]
    pub chrome: SiteChrome,
    pub featured: Vec<MenuCard>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuPage {
    #[serde(flatten)]
    pub chrome: SiteChrome,
    pub categories: Vec<CategoryChip>,
    pub tags: Vec<TagChip>,
    pub items: Vec<MenuCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReviewsPage {
    #[serde(flatten)]
    pub chrome: SiteChrome,
    pub featured: Vec<ReviewRecord>,
    pub others: Vec<ReviewRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationPage {
    #[serde(flatten)]
    pub chrome: SiteChrome,
    pub address: Option<String>,
    pub maps_api_key: Option<String>,
}

/// One entry of the calendar feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub id: i64,
    pub title: String,
    #[serde(with = "local_datetime")]
    pub start: PrimitiveDateTime,
    #[serde(with = "local_datetime::option")]
    pub end: Option<PrimitiveDateTime>,
    pub description: Option<String>,
}

impl From<EventRecord> for CalendarEntry {
    fn from(event: EventRecord) -> Self {
        Self {
            id: event.id,
            title: event.title,
            start: event.starts_at,
            end: event.ends_at,
            description: event.description,
        }
    }
}

#[derive(Clone)]
pub struct PublicService {
    menu: Arc<dyn MenuRepo>,
    events: Arc<dyn EventsRepo>,
    reviews: Arc<dyn ReviewsRepo>,
    cache: Arc<SiteCache>,
    maps_api_key: Option<String>,
}

impl PublicService {
    pub fn new(
        menu: Arc<dyn MenuRepo>,
        events: Arc<dyn EventsRepo>,
        reviews: Arc<dyn ReviewsRepo>,
        cache: Arc<SiteCache>,
        maps_api_key: Option<String>,
    ) -> Self {
        Self {
            menu,
            events,
            reviews,
            cache,
            maps_api_key,
        }
    }

    pub async fn chrome(&self) -> SiteChrome {
        let settings = self.cache.get_site_settings().await.unwrap_or_else(|err| {
            warn!(target = SOURCE, error = %err, "site settings unavailable");
            None
        });
        let hours = self.cache.get_hours().await.unwrap_or_else(|err| {
            warn!(target = SOURCE, error = %err, "opening hours unavailable");
            None
        });
        SiteChrome { settings, hours }
    }

    /// Top three featured items and the next three published events.
    pub async fn home(&self) -> HomePage {
        let chrome = self.chrome().await;

        let featured = match self.featured_cards().await {
            Ok(cards) => cards,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "featured items unavailable");
                Vec::new()
            }
        };
        let events = match self
            .events
            .list_upcoming(now_local(), HOME_EVENTS_LIMIT)
            .await
        {
            Ok(events) => events,
            Err(err) => {
                warn!(target = SOURCE, error = %err, "upcoming events unavailable");
                Vec::new()
            }
        };

        HomePage {
            chrome,
            featured,
            events,
        }
    }

    pub async fn menu(&self) -> Result<MenuPage, PublicError> {
        let categories = self.menu.list_categories().await?;
        let tags = self.menu.list_tags().await?;
        let filter = MenuItemFilter {
            available_only: true,
            ..MenuItemFilter::default()
        };
        let items = self.menu.list_items(&filter).await?;

        let lookup = Lookup::new(&categories, &tags);
        let items = items.into_iter().map(|item| lookup.card(item)).collect();

        Ok(MenuPage {
            chrome: self.chrome().await,
            categories: categories
                .into_iter()
                .map(|category| CategoryChip {
                    id: category.slug,
                    name: category.name,
                })
                .collect(),
            tags: tags.into_iter().map(TagChip::from).collect(),
            items,
        })
    }

    pub async fn reviews(&self) -> Result<ReviewsPage, PublicError> {
        Ok(ReviewsPage {
            featured: self.reviews.list_featured_reviews().await?,
            others: self.reviews.list_other_reviews(REVIEWS_OTHER_LIMIT).await?,
            chrome: self.chrome().await,
        })
    }

    pub async fn location(&self) -> LocationPage {
        let chrome = self.chrome().await;
        let address = chrome
            .settings
            .as_ref()
            .and_then(|settings| settings.full_address());
        LocationPage {
            chrome,
            address,
            maps_api_key: self.maps_api_key.clone(),
        }
    }

    /// Published events overlapping `[start, end]`.
    pub async fn calendar(
        &self,
        start: PrimitiveDateTime,
        end: PrimitiveDateTime,
    ) -> Result<Vec<CalendarEntry>, PublicError> {
        let events = self.events.list_in_range(start, end).await?;
        Ok(events.into_iter().map(CalendarEntry::from).collect())
    }

    pub async fn upcoming(&self) -> Result<Vec<EventRecord>, PublicError> {
        self.events
            .list_upcoming(now_local(), UPCOMING_EVENTS_LIMIT)
            .await
            .map_err(PublicError::from)
    }

    async fn featured_cards(&self) -> Result<Vec<MenuCard>, RepoError> {
        let items = self.menu.list_featured_items(HOME_FEATURED_LIMIT).await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let categories = self.menu.list_categories().await?;
        let tags = self.menu.list_tags().await?;
        let lookup = Lookup::new(&categories, &tags);
        Ok(items.into_iter().map(|item| lookup.card(item)).collect())
    }
}

/// Id to slug maps used when turning items into cards.
struct Lookup {
    categories: HashMap<i64, String>,
    tags: HashMap<i64, String>,
}

impl Lookup {
    fn new(categories: &[MenuCategoryRecord], tags: &[MenuTagRecord]) -> Self {
        Self {
            categories: categories
                .iter()
                .map(|category| (category.id, category.slug.clone()))
                .collect(),
            tags: tags.iter().map(|tag| (tag.id, tag.slug.clone())).collect(),
        }
    }

    fn card(&self, item: MenuItemRecord) -> MenuCard {
        let category = item
            .category_id
            .and_then(|id| self.categories.get(&id).cloned())
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let tags = item
            .tag_ids
            .iter()
            .filter_map(|id| self.tags.get(id).cloned())
            .collect();

        MenuCard {
            id: item.id,
            name: item.name,
            description: item.description,
            price: price_amount(item.price_cents),
            category,
            tags,
            img: item
                .image_url
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category_id: Option<i64>, tag_ids: Vec<i64>, image: Option<&str>) -> MenuItemRecord {
        MenuItemRecord {
            id: 7,
            name: "Fish Tacos".to_string(),
            category_id,
            price_cents: 1450,
            description: None,
            image_url: image.map(str::to_string),
            available: true,
            featured_rank: 1,
            tag_ids,
        }
    }

    fn lookup() -> Lookup {
        let categories = vec![MenuCategoryRecord {
            id: 1,
            name: "Mains".to_string(),
            slug: "mains".to_string(),
            sort_order: 0,
        }];
        let tags = vec![MenuTagRecord {
            id: 3,
            name: "Spicy".to_string(),
            slug: "spicy".to_string(),
            kind: TagKind::Spice,
            icon: None,
        }];
        Lookup::new(&categories, &tags)
    }

    #[test]
    fn cards_carry_slugs_and_decimal_price() {
        let card = lookup().card(item(Some(1), vec![3, 99], Some("/static/media/a.jpg")));
        assert_eq!(card.category, "mains");
        assert_eq!(card.tags, vec!["spicy".to_string()]);
        assert!((card.price - 14.5).abs() < f64::EPSILON);
        assert_eq!(card.img, "/static/media/a.jpg");
    }

    #[test]
    fn missing_category_and_image_fall_back() {
        let card = lookup().card(item(None, Vec::new(), None));
        assert_eq!(card.category, UNCATEGORIZED);
        assert_eq!(card.img, PLACEHOLDER_IMAGE);
    }
}
