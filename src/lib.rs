//! Taproom: public site, JSON API and back office for a restaurant and live-music venue.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
