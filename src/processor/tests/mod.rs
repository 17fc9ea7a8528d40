//! Integration tests for the processor module
//!
//! Runs the complete join pipeline over small trip and air-quality CSV
//! fixtures written to temporary directories.


use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const TRIP_HEADER: &str = "tripduration,starttime,startstationid,startstationlatitude,startstationlongitude,endstationid,usertype";

pub const AIR_QUALITY_HEADER: &str = "Date,Daily Mean PM2.5 Concentration,Daily AQI Value,State,County,Site Latitude,Site Longitude,Local Site Name";

/// Write a CSV file with the given header and rows
pub fn write_csv(temp_dir: &TempDir, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let path = temp_dir.path().join(name);
    let mut content = format!("{header}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

/// Two trip files, one air-quality file and an output location.
///
/// Expected outcome: rides 0 and `1 << 33` match, the `not-a-date` ride and
/// the 2019-07-10 ride (no readings that day) do not.
pub fn create_join_inputs(temp_dir: &TempDir) -> (Vec<PathBuf>, PathBuf, PathBuf) {
    let trips_2019 = write_csv(
        temp_dir,
        "2019_citibike.csv",
        TRIP_HEADER,
        &[
            "600,2019-07-09 08:15:00,72,40.73,-73.99,505,Subscriber",
            "420,not-a-date,79,40.72,-74.00,3255,Customer",
            "300,2019-07-10 07:05:00,82,40.71,-74.01,116,Subscriber",
        ],
    );
    let trips_later = write_csv(
        temp_dir,
        "2019_citibike_late.csv",
        TRIP_HEADER,
        &["900,2019-07-09 07:45:12,83,40.99,-73.02,,Customer"],
    );
    let air_quality = write_csv(
        temp_dir,
        "Air_Quality.csv",
        AIR_QUALITY_HEADER,
        &[
            "07/09/2019,10.0,42,New York,Queens,40.75,-74.00,Queens College",
            "07/09/2019,,45,New York,Queens,40.75,-74.00,Queens College",
            "07/09/2019,14.0,48,New York,Queens,40.75,-74.00,Queens College",
            "07/09/2019,8.0,33,New York,Suffolk,41.00,-73.00,Holtsville",
            "7/8/2019,9.5,40,New York,Bronx,40.81,-73.88,IS 52",
        ],
    );
    let output = temp_dir.path().join("joined_output");

    (vec![trips_2019, trips_later], air_quality, output)
}
