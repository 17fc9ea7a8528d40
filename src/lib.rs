//! Ride / Air-Quality Join Library
//!
//! A Rust library for enriching bike-share trip records with the daily
//! air-quality reading of the nearest monitoring site.
//!
//! This library provides tools for:
//! - Discovering trip and air-quality CSV inputs (files, directories, globs)
//! - Normalizing both sources into typed records with explicit nulls
//! - Averaging PM2.5 and AQI per monitoring site and calendar day
//! - Joining trips to same-day sites and keeping the closest one per ride
//! - Writing the matches as size-bounded Apache Parquet files

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod processor;
pub mod schema;
pub mod temporal;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::{CompressionAlgorithm, JoinConfig};
pub use error::{JoinError, Result};
pub use models::{
    AirQualityReading, MatchedTrip, ProcessingStats, SiteDayAggregate, SiteMatchCount, TripRecord,
};
pub use processor::JoinProcessor;
