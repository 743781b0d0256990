//! Domain layer types and invariants.

pub mod datetime;
pub mod entities;
pub mod error;
pub mod hours;
pub mod menu;
pub mod types;
