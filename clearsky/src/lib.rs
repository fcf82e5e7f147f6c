pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod reading;
pub mod telemetry;
pub mod weather;

pub use api::routes;
pub use reading::{NewReading, Reading};
