pub mod api;
pub mod checkin;
pub mod config;
pub mod error;
pub mod geofence;
pub mod location;
pub mod models;
pub mod reconcile;

pub use error::{AppError, Result};
