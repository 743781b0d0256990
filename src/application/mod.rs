//! Application services layer.

pub mod admin;
pub mod auth;
pub mod error;
pub mod forms;
pub mod media;
pub mod public;
pub mod repos;
pub mod site_cache;
pub mod submissions;

use std::sync::Arc;

use repos::{
    EventsRepo, EventsWriteRepo, HealthRepo, MenuRepo, MenuWriteRepo, MusicianRepo, RentalsRepo,
    ReviewsRepo, SiteRepo,
};

/// Every repository interface the services need, usually backed by one adapter.
#[derive(Clone)]
pub struct Repositories {
    pub menu: Arc<dyn MenuRepo>,
    pub menu_write: Arc<dyn MenuWriteRepo>,
    pub events: Arc<dyn EventsRepo>,
    pub events_write: Arc<dyn EventsWriteRepo>,
    pub rentals: Arc<dyn RentalsRepo>,
    pub musicians: Arc<dyn MusicianRepo>,
    pub reviews: Arc<dyn ReviewsRepo>,
    pub site: Arc<dyn SiteRepo>,
    pub health: Arc<dyn HealthRepo>,
}

impl Repositories {
    pub fn from_shared<R>(repo: Arc<R>) -> Self
    where
        R: MenuRepo
            + MenuWriteRepo
            + EventsRepo
            + EventsWriteRepo
            + RentalsRepo
            + MusicianRepo
            + ReviewsRepo
            + SiteRepo
            + HealthRepo
            + 'static,
    {
        Self {
            menu: repo.clone(),
            menu_write: repo.clone(),
            events: repo.clone(),
            events_write: repo.clone(),
            rentals: repo.clone(),
            musicians: repo.clone(),
            reviews: repo.clone(),
            site: repo.clone(),
            health: repo,
        }
    }
}
