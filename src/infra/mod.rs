//! Infrastructure adapters and runtime bootstrap.

pub mod cloudinary;
pub mod db;
pub mod error;
pub mod forms;
pub mod http;
pub mod telemetry;
pub mod uploads;
