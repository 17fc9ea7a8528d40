//! Application constants for the ride / air-quality join.
//!
//! Column names of both raw sources, the normalized field names used in the
//! output, timestamp patterns and run defaults.

// =============================================================================
// Trip Source Columns
// =============================================================================

/// Raw trip CSV column names
pub mod trip_columns {
    pub const TRIP_DURATION: &str = "tripduration";
    pub const START_TIME: &str = "starttime";
    pub const START_STATION_ID: &str = "startstationid";
    pub const START_STATION_LATITUDE: &str = "startstationlatitude";
    pub const START_STATION_LONGITUDE: &str = "startstationlongitude";
    pub const END_STATION_ID: &str = "endstationid";
    pub const USER_TYPE: &str = "usertype";

    /// Columns every trip file must carry
    pub const REQUIRED: &[&str] = &[
        TRIP_DURATION,
        START_TIME,
        START_STATION_ID,
        START_STATION_LATITUDE,
        START_STATION_LONGITUDE,
        END_STATION_ID,
        USER_TYPE,
    ];
}

// =============================================================================
// Air-Quality Source Columns
// =============================================================================

/// Raw air-quality CSV column names
pub mod air_quality_columns {
    pub const DATE: &str = "Date";
    pub const PM25_CONCENTRATION: &str = "Daily Mean PM2.5 Concentration";
    pub const AQI_VALUE: &str = "Daily AQI Value";
    pub const STATE: &str = "State";
    pub const COUNTY: &str = "County";
    pub const SITE_LATITUDE: &str = "Site Latitude";
    pub const SITE_LONGITUDE: &str = "Site Longitude";
    pub const LOCAL_SITE_NAME: &str = "Local Site Name";

    /// Columns every air-quality file must carry
    pub const REQUIRED: &[&str] = &[
        DATE,
        PM25_CONCENTRATION,
        AQI_VALUE,
        STATE,
        COUNTY,
        SITE_LATITUDE,
        SITE_LONGITUDE,
        LOCAL_SITE_NAME,
    ];
}

// =============================================================================
// Normalized Field Names
// =============================================================================

/// Field names after normalization; also the persisted output column names
pub mod fields {
    pub const TRIP_DURATION: &str = "trip_duration";
    pub const TRIP_START_TIME: &str = "trip_start_time";
    pub const TRIP_START_TIMESTAMP: &str = "trip_start_timestamp";
    pub const START_STATION_ID: &str = "start_station_id";
    pub const START_STATION_LATITUDE: &str = "start_station_latitude";
    pub const START_STATION_LONGITUDE: &str = "start_station_longitude";
    pub const END_STATION_ID: &str = "end_station_id";
    pub const USER_TYPE: &str = "user_type";
    pub const RIDE_ID: &str = "ride_id";

    pub const DATE: &str = "date";
    pub const PM25_CONCENTRATION: &str = "pm25_concentration";
    pub const AIR_QUALITY_INDEX: &str = "air_quality_index";
    pub const STATE: &str = "State";
    pub const COUNTY: &str = "County";
    pub const SITE_LATITUDE: &str = "site_latitude";
    pub const SITE_LONGITUDE: &str = "site_longitude";
    pub const LOCAL_SITE_NAME: &str = "Local Site Name";

    pub const AVG_PM25: &str = "avg_pm25";
    pub const AVG_AQI: &str = "avg_aqi";
    pub const SQUARED_DISTANCE: &str = "squared_distance";
}

// =============================================================================
// Temporal Patterns
// =============================================================================

/// Trip start time pattern (`yyyy-MM-dd HH:mm:ss`)
pub const TRIP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Canonical calendar-date rendering (`yyyy-MM-dd`)
pub const TRIP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Air-quality reading date pattern (`MM/dd/yyyy`)
pub const READING_DATE_FORMAT: &str = "%m/%d/%Y";

// =============================================================================
// Run Defaults
// =============================================================================

/// Trip files used when the command line is incomplete
pub const DEFAULT_TRIP_PATHS: &[&str] = &[
    "2017_citibike_morning_rush_07_09.csv",
    "2018_citibike_morning_hours_07_09.csv",
    "2019_citibike_morning_rush_07_09.csv",
];

/// Air-quality file used when the command line is incomplete
pub const DEFAULT_AIR_QUALITY_PATH: &str = "Air_Quality.csv";

/// Output directory used when the command line is incomplete
pub const DEFAULT_OUTPUT_PATH: &str = "joined_output";

/// Maximum records written to a single output file
pub const DEFAULT_MAX_RECORDS_PER_FILE: usize = 100_000;

/// Matched trips shown in the console preview
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Per-site counts shown in the console preview
pub const DEFAULT_PREVIEW_SITE_COUNTS: usize = 10;

/// File extension of tabular inputs
pub const CSV_EXTENSION: &str = "csv";

/// File name prefix of output parts
pub const OUTPUT_FILE_PREFIX: &str = "part";

/// File extension of output parts
pub const PARQUET_EXTENSION: &str = "parquet";

/// Bit offset of the file index inside a ride identifier
pub const RIDE_ID_PARTITION_SHIFT: u32 = 33;
