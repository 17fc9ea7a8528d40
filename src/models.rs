//! Core data structures for the ride / air-quality join.
//!
//! Typed records for both sources, the per-site daily aggregate, the final
//! matched trip and processing statistics. Every nullable value in the raw
//! sources is an `Option`; no sentinel values are used.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One bicycle trip after schema normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    /// Unique within a run; monotonically increasing but not contiguous
    pub ride_id: i64,
    pub trip_duration: Option<String>,
    /// Raw start time text as read from the source
    pub trip_start_time: Option<String>,
    pub trip_start_timestamp: Option<NaiveDateTime>,
    /// `yyyy-MM-dd` rendering of the start date
    pub trip_start_date: Option<String>,
    pub start_station_id: Option<String>,
    pub start_station_latitude: Option<f64>,
    pub start_station_longitude: Option<f64>,
    pub end_station_id: Option<String>,
    pub user_type: Option<String>,
}

impl TripRecord {
    /// Calendar date used as the join key
    pub fn date_key(&self) -> Option<NaiveDate> {
        self.trip_start_timestamp.map(|timestamp| timestamp.date())
    }
}

/// One raw air-quality observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    pub date: Option<NaiveDate>,
    pub pm25_concentration: Option<f64>,
    pub air_quality_index: Option<f64>,
    pub state: Option<String>,
    pub county: Option<String>,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
    pub local_site_name: Option<String>,
}

/// Mean of pm2.5 and AQI for one monitoring site on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDayAggregate {
    pub local_site_name: Option<String>,
    pub county: Option<String>,
    pub date: Option<NaiveDate>,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
    pub avg_pm25: Option<f64>,
    pub avg_aqi: Option<f64>,
}

/// A trip joined to its closest same-date monitoring site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedTrip {
    pub trip_duration: Option<String>,
    pub start_station_id: Option<String>,
    pub start_station_latitude: Option<f64>,
    pub start_station_longitude: Option<f64>,
    pub end_station_id: Option<String>,
    pub user_type: Option<String>,
    pub trip_start_timestamp: Option<NaiveDateTime>,
    pub ride_id: i64,
    pub local_site_name: Option<String>,
    pub county: Option<String>,
    pub date: Option<NaiveDate>,
    pub site_latitude: Option<f64>,
    pub site_longitude: Option<f64>,
    pub avg_pm25: Option<f64>,
    pub avg_aqi: Option<f64>,
    pub squared_distance: f64,
}

impl MatchedTrip {
    /// Combine a trip with its selected site, dropping the raw start time
    /// text and the derived date string
    pub fn from_parts(trip: &TripRecord, site: &SiteDayAggregate, squared_distance: f64) -> Self {
        Self {
            trip_duration: trip.trip_duration.clone(),
            start_station_id: trip.start_station_id.clone(),
            start_station_latitude: trip.start_station_latitude,
            start_station_longitude: trip.start_station_longitude,
            end_station_id: trip.end_station_id.clone(),
            user_type: trip.user_type.clone(),
            trip_start_timestamp: trip.trip_start_timestamp,
            ride_id: trip.ride_id,
            local_site_name: site.local_site_name.clone(),
            county: site.county.clone(),
            date: site.date,
            site_latitude: site.site_latitude,
            site_longitude: site.site_longitude,
            avg_pm25: site.avg_pm25,
            avg_aqi: site.avg_aqi,
            squared_distance,
        }
    }
}

/// Number of matched trips attributed to one site name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteMatchCount {
    pub local_site_name: Option<String>,
    pub ride_count: usize,
}

/// Result of persisting the matched trips
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub files_written: usize,
    pub rows_written: usize,
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub trip_files: usize,
    pub air_quality_files: usize,
    pub trips_loaded: usize,
    pub trips_without_date: usize,
    pub readings_loaded: usize,
    pub site_day_aggregates: usize,
    pub candidate_pairs: usize,
    pub matched_trips: usize,
    pub files_written: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
