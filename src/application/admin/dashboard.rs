use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::application::repos::{
    EventsRepo, MenuRepo, MusicianRepo, RentalsRepo, RepoError, ReviewsRepo,
};
use crate::domain::datetime::now_local;
use crate::domain::types::{MusicianStatus, RentalStatus};

const SOURCE: &str = "application::admin::dashboard";

/// Headline numbers for the back-office landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub menu_items: u64,
    pub upcoming_events: u64,
    pub new_rentals: u64,
    pub new_musician_apps: u64,
    pub reviews: u64,
}

#[derive(Clone)]
pub struct AdminDashboardService {
    menu: Arc<dyn MenuRepo>,
    events: Arc<dyn EventsRepo>,
    rentals: Arc<dyn RentalsRepo>,
    musicians: Arc<dyn MusicianRepo>,
    reviews: Arc<dyn ReviewsRepo>,
}

impl AdminDashboardService {
    pub fn new(
        menu: Arc<dyn MenuRepo>,
        events: Arc<dyn EventsRepo>,
        rentals: Arc<dyn RentalsRepo>,
        musicians: Arc<dyn MusicianRepo>,
        reviews: Arc<dyn ReviewsRepo>,
    ) -> Self {
        Self {
            menu,
            events,
            rentals,
            musicians,
            reviews,
        }
    }

    /// Each count degrades to zero on its own so one failing table does not blank
    /// the whole page.
    pub async fn counts(&self) -> DashboardCounts {
        DashboardCounts {
            menu_items: or_zero("menu_items", self.menu.count_items().await),
            upcoming_events: or_zero(
                "upcoming_events",
                self.events.count_upcoming(now_local()).await,
            ),
            new_rentals: or_zero(
                "new_rentals",
                self.rentals
                    .count_rentals_with_status(RentalStatus::New)
                    .await,
            ),
            new_musician_apps: or_zero(
                "new_musician_apps",
                self.musicians
                    .count_applications_with_status(MusicianStatus::New)
                    .await,
            ),
            reviews: or_zero("reviews", self.reviews.count_reviews().await),
        }
    }
}

fn or_zero(metric: &'static str, result: Result<u64, RepoError>) -> u64 {
    result.unwrap_or_else(|err| {
        warn!(target = SOURCE, metric, error = %err, "dashboard count failed");
        0
    })
}
