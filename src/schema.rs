//! Schema normalization for both input sources.
//!
//! Raw CSV files are read with every column as text, checked for the
//! required header columns, then projected through a Polars lazy frame that
//! renames columns and casts coordinates. The projected frame is finally
//! turned into typed records, which is where temporal keys are extracted.

use crate::constants::{air_quality_columns, fields, trip_columns};
use crate::error::{JoinError, Result};
use crate::models::{AirQualityReading, TripRecord};
use crate::temporal::{format_trip_date, parse_reading_date, parse_trip_timestamp};
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// The two tabular sources the pipeline reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Trips,
    AirQuality,
}

impl SourceKind {
    /// Human readable source name used in errors and logs
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Trips => "trip",
            SourceKind::AirQuality => "air-quality",
        }
    }

    /// Header columns a file of this source must contain
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            SourceKind::Trips => trip_columns::REQUIRED,
            SourceKind::AirQuality => air_quality_columns::REQUIRED,
        }
    }

    /// Rename and cast expressions mapping raw columns to normalized fields
    pub fn projection(&self) -> Vec<Expr> {
        match self {
            SourceKind::Trips => vec![
                col(trip_columns::TRIP_DURATION).alias(fields::TRIP_DURATION),
                col(trip_columns::START_TIME).alias(fields::TRIP_START_TIME),
                col(trip_columns::START_STATION_ID).alias(fields::START_STATION_ID),
                numeric_col(trip_columns::START_STATION_LATITUDE, fields::START_STATION_LATITUDE),
                numeric_col(trip_columns::START_STATION_LONGITUDE, fields::START_STATION_LONGITUDE),
                col(trip_columns::END_STATION_ID).alias(fields::END_STATION_ID),
                col(trip_columns::USER_TYPE).alias(fields::USER_TYPE),
            ],
            SourceKind::AirQuality => vec![
                col(air_quality_columns::DATE).alias(fields::DATE),
                numeric_col(air_quality_columns::PM25_CONCENTRATION, fields::PM25_CONCENTRATION),
                col(air_quality_columns::AQI_VALUE).alias(fields::AIR_QUALITY_INDEX),
                col(air_quality_columns::STATE).alias(fields::STATE),
                col(air_quality_columns::COUNTY).alias(fields::COUNTY),
                numeric_col(air_quality_columns::SITE_LATITUDE, fields::SITE_LATITUDE),
                numeric_col(air_quality_columns::SITE_LONGITUDE, fields::SITE_LONGITUDE),
                col(air_quality_columns::LOCAL_SITE_NAME).alias(fields::LOCAL_SITE_NAME),
            ],
        }
    }
}

/// Text column cast to `Float64` after trimming surrounding whitespace;
/// anything still non-numeric becomes null
fn numeric_col(raw: &str, field: &str) -> Expr {
    col(raw)
        .str()
        .strip_chars(lit(NULL))
        .cast(DataType::Float64)
        .alias(field)
}

/// Read a headered CSV file keeping every column as text
pub fn read_csv_as_text(path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Fail with `SchemaMismatch` when any required column is absent
pub fn validate_columns(df: &DataFrame, source: SourceKind, path: &Path) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = source
        .required_columns()
        .iter()
        .filter(|name| !present.iter().any(|column| column.as_str() == **name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(JoinError::SchemaMismatch {
            source_name: source.name().to_string(),
            path: path.to_path_buf(),
            missing,
        })
    }
}

/// Validate and project a raw frame into normalized field names and types
pub fn normalize_frame(df: DataFrame, source: SourceKind, path: &Path) -> Result<DataFrame> {
    validate_columns(&df, source, path)?;
    let normalized = df.lazy().select(source.projection()).collect()?;
    Ok(normalized)
}

/// Build trip records from a normalized trip frame.
///
/// Ride identifiers are `id_base + row`, so callers choose disjoint bases
/// per file to keep identifiers unique across a run.
pub fn trips_from_frame(df: &DataFrame, id_base: i64) -> Result<Vec<TripRecord>> {
    let durations = text_values(df, fields::TRIP_DURATION)?;
    let start_times = text_values(df, fields::TRIP_START_TIME)?;
    let start_ids = text_values(df, fields::START_STATION_ID)?;
    let latitudes = float_values(df, fields::START_STATION_LATITUDE)?;
    let longitudes = float_values(df, fields::START_STATION_LONGITUDE)?;
    let end_ids = text_values(df, fields::END_STATION_ID)?;
    let user_types = text_values(df, fields::USER_TYPE)?;

    let records = durations
        .into_iter()
        .zip(start_times)
        .zip(start_ids)
        .zip(latitudes)
        .zip(longitudes)
        .zip(end_ids)
        .zip(user_types)
        .enumerate()
        .map(
            |(row, ((((((duration, start_time), start_id), lat), lon), end_id), user_type))| {
                let timestamp = start_time.as_deref().and_then(parse_trip_timestamp);
                TripRecord {
                    ride_id: id_base + row as i64,
                    trip_duration: duration,
                    trip_start_date: timestamp.as_ref().map(format_trip_date),
                    trip_start_time: start_time,
                    trip_start_timestamp: timestamp,
                    start_station_id: start_id,
                    start_station_latitude: lat,
                    start_station_longitude: lon,
                    end_station_id: end_id,
                    user_type,
                }
            },
        )
        .collect();

    Ok(records)
}

/// Build air-quality readings from a normalized air-quality frame
pub fn readings_from_frame(df: &DataFrame) -> Result<Vec<AirQualityReading>> {
    let dates = text_values(df, fields::DATE)?;
    let pm25 = float_values(df, fields::PM25_CONCENTRATION)?;
    let aqi = text_values(df, fields::AIR_QUALITY_INDEX)?;
    let states = text_values(df, fields::STATE)?;
    let counties = text_values(df, fields::COUNTY)?;
    let latitudes = float_values(df, fields::SITE_LATITUDE)?;
    let longitudes = float_values(df, fields::SITE_LONGITUDE)?;
    let site_names = text_values(df, fields::LOCAL_SITE_NAME)?;

    let readings = dates
        .into_iter()
        .zip(pm25)
        .zip(aqi)
        .zip(states)
        .zip(counties)
        .zip(latitudes)
        .zip(longitudes)
        .zip(site_names)
        .map(
            |(((((((date, pm25), aqi), state), county), lat), lon), site_name)| {
                AirQualityReading {
                    date: date.as_deref().and_then(parse_reading_date),
                    pm25_concentration: pm25,
                    air_quality_index: aqi.as_deref().and_then(parse_numeric),
                    state,
                    county,
                    site_latitude: lat,
                    site_longitude: lon,
                    local_site_name: site_name,
                }
            },
        )
        .collect();

    Ok(readings)
}

/// Interpret text as a number; non-numeric text is null
fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok()
}

fn text_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let values = df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect();
    Ok(values)
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df
        .column(name)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect();
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    const TRIP_CSV: &str = "\
tripduration,starttime,stoptime,startstationid,startstationname,startstationlatitude,startstationlongitude,endstationid,usertype
600,2019-07-09 08:15:00,2019-07-09 08:25:00,72,W 52 St,40.73,-73.99,505,Subscriber
420,not-a-date,2019-07-09 08:25:00,79,Franklin St,40.72,abc,3255,Customer
";

    const AIR_QUALITY_CSV: &str = "\
Date,Source,Daily Mean PM2.5 Concentration,Daily AQI Value,State,County,Site Latitude,Site Longitude,Local Site Name
07/09/2019,AQS,10.0,42,New York,Queens,40.736,-73.822,Queens College
07/09/2019,AQS,,n/a,New York,Queens,40.736,-73.822,Queens College
bad-date,AQS,14.0,55,New York,Bronx,40.816,-73.902,IS 52
";

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_csv_as_text_keeps_strings() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "trips.csv", TRIP_CSV);

        let df = read_csv_as_text(&path).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.column("tripduration").unwrap().dtype(),
            &DataType::String
        );
    }

    #[test]
    fn test_validate_columns_reports_missing() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "trips.csv", "tripduration,starttime\n600,2019-07-09 08:15:00\n");
        let df = read_csv_as_text(&path).unwrap();

        let err = validate_columns(&df, SourceKind::Trips, &path).unwrap_err();
        match err {
            JoinError::SchemaMismatch {
                source_name,
                missing,
                ..
            } => {
                assert_eq!(source_name, "trip");
                assert!(missing.contains(&"startstationlatitude".to_string()));
                assert!(missing.contains(&"usertype".to_string()));
                assert!(!missing.contains(&"tripduration".to_string()));
            }
            other => panic!("Expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_trips_from_frame() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "trips.csv", TRIP_CSV);
        let df = normalize_frame(read_csv_as_text(&path).unwrap(), SourceKind::Trips, &path)
            .unwrap();

        let trips = trips_from_frame(&df, 100).unwrap();

        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].ride_id, 100);
        assert_eq!(trips[1].ride_id, 101);
        assert_eq!(trips[0].trip_duration.as_deref(), Some("600"));
        assert_eq!(trips[0].trip_start_date.as_deref(), Some("2019-07-09"));
        assert_eq!(trips[0].start_station_latitude, Some(40.73));
        assert_eq!(trips[0].start_station_longitude, Some(-73.99));
        assert_eq!(trips[0].user_type.as_deref(), Some("Subscriber"));

        // Unparseable start time and coordinate become null, the row is kept
        assert_eq!(trips[1].trip_start_time.as_deref(), Some("not-a-date"));
        assert_eq!(trips[1].trip_start_timestamp, None);
        assert_eq!(trips[1].trip_start_date, None);
        assert_eq!(trips[1].start_station_longitude, None);
    }

    #[test]
    fn test_readings_from_frame() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "aq.csv", AIR_QUALITY_CSV);
        let df = normalize_frame(
            read_csv_as_text(&path).unwrap(),
            SourceKind::AirQuality,
            &path,
        )
        .unwrap();

        let readings = readings_from_frame(&df).unwrap();

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].date, NaiveDate::from_ymd_opt(2019, 7, 9));
        assert_eq!(readings[0].pm25_concentration, Some(10.0));
        assert_eq!(readings[0].air_quality_index, Some(42.0));
        assert_eq!(readings[0].local_site_name.as_deref(), Some("Queens College"));
        assert_eq!(readings[0].county.as_deref(), Some("Queens"));
        assert_eq!(readings[0].state.as_deref(), Some("New York"));
        assert_eq!(readings[0].site_latitude, Some(40.736));

        assert_eq!(readings[1].pm25_concentration, None);
        assert_eq!(readings[1].air_quality_index, None);
        assert_eq!(readings[2].date, None);
    }

    #[test]
    fn test_normalize_frame_rejects_wrong_source() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "aq.csv", AIR_QUALITY_CSV);
        let df = read_csv_as_text(&path).unwrap();

        let result = normalize_frame(df, SourceKind::Trips, &path);
        assert!(matches!(result, Err(JoinError::SchemaMismatch { .. })));
    }

    #[test]
    fn test_padded_numbers_are_trimmed_before_casting() {
        let dir = TempDir::new().unwrap();
        let trips = write(
            &dir,
            "padded_trips.csv",
            "tripduration,starttime,startstationid,startstationlatitude,startstationlongitude,endstationid,usertype\n\
             600,2019-07-09 08:15:00,72, 40.73,-73.99 ,505,Subscriber\n\
             420,2019-07-09 08:20:00,79,  ,n/a,3255,Customer\n",
        );
        let readings = write(
            &dir,
            "padded_aq.csv",
            "Date,Daily Mean PM2.5 Concentration,Daily AQI Value,State,County,Site Latitude,Site Longitude,Local Site Name\n\
             07/09/2019, 10.5 ,42,New York,Queens,\t40.736, -73.822,Queens College\n",
        );

        let df = read_csv_as_text(&trips).unwrap();
        let normalized = normalize_frame(df, SourceKind::Trips, &trips).unwrap();
        let records = trips_from_frame(&normalized, 0).unwrap();

        assert_eq!(records[0].start_station_latitude, Some(40.73));
        assert_eq!(records[0].start_station_longitude, Some(-73.99));
        assert_eq!(records[1].start_station_latitude, None);
        assert_eq!(records[1].start_station_longitude, None);

        let df = read_csv_as_text(&readings).unwrap();
        let normalized = normalize_frame(df, SourceKind::AirQuality, &readings).unwrap();
        let parsed = readings_from_frame(&normalized).unwrap();

        assert_eq!(parsed[0].pm25_concentration, Some(10.5));
        assert_eq!(parsed[0].site_latitude, Some(40.736));
        assert_eq!(parsed[0].site_longitude, Some(-73.822));
    }
}
