//! Rental requests and musician applications submitted from the public site.

use std::sync::Arc;

use tracing::info;

use crate::application::admin::{AdminError, non_blank, not_found_as};
use crate::application::repos::{InboxFilter, MusicianRepo, RentalsRepo};
use crate::domain::entities::{MusicianAppRecord, RentalRecord};
use crate::domain::types::{MusicianStatus, RentalStatus};

const SOURCE: &str = "application::admin::inbox";

pub const INBOX_LIMIT: u32 = 200;

#[derive(Clone)]
pub struct AdminInboxService {
    rentals: Arc<dyn RentalsRepo>,
    musicians: Arc<dyn MusicianRepo>,
}

impl AdminInboxService {
    pub fn new(rentals: Arc<dyn RentalsRepo>, musicians: Arc<dyn MusicianRepo>) -> Self {
        Self { rentals, musicians }
    }

    /// Blank filters are ignored; an unknown status is a validation error.
    pub async fn list_rentals(
        &self,
        status: Option<String>,
        venue_area: Option<String>,
        search: Option<String>,
    ) -> Result<Vec<RentalRecord>, AdminError> {
        let filter = InboxFilter {
            status: parse_status_filter::<RentalStatus>(status)?,
            venue_area: non_blank(venue_area),
            search: non_blank(search),
            limit: INBOX_LIMIT,
        };
        self.rentals
            .list_rentals(&filter)
            .await
            .map_err(AdminError::from)
    }

    pub async fn set_rental_status(&self, id: i64, status: &str) -> Result<RentalStatus, AdminError> {
        let status: RentalStatus = status.parse()?;
        self.rentals
            .set_rental_status(id, status)
            .await
            .map_err(not_found_as("rental"))?;
        info!(target = SOURCE, id, status = %status, "rental status updated");
        Ok(status)
    }

    pub async fn list_applications(
        &self,
        status: Option<String>,
        search: Option<String>,
    ) -> Result<Vec<MusicianAppRecord>, AdminError> {
        let filter = InboxFilter {
            status: parse_status_filter::<MusicianStatus>(status)?,
            venue_area: None,
            search: non_blank(search),
            limit: INBOX_LIMIT,
        };
        self.musicians
            .list_applications(&filter)
            .await
            .map_err(AdminError::from)
    }

    pub async fn set_application_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<MusicianStatus, AdminError> {
        let status: MusicianStatus = status.parse()?;
        self.musicians
            .set_application_status(id, status)
            .await
            .map_err(not_found_as("musician application"))?;
        info!(target = SOURCE, id, status = %status, "musician application status updated");
        Ok(status)
    }
}

fn parse_status_filter<S>(value: Option<String>) -> Result<Option<S>, AdminError>
where
    S: std::str::FromStr<Err = crate::domain::error::DomainError>,
{
    non_blank(value)
        .map(|raw| raw.parse::<S>().map_err(AdminError::from))
        .transpose()
}
