//! End-to-end tests for the ride / air-quality join
//!
//! Drives the public `JoinProcessor` API over CSV fixtures shaped like the
//! citibike morning-rush extracts and the EPA daily PM2.5 export, then
//! reloads the parquet output.

use ride_aq_join::processor::writer::{list_part_files, read_matches};
use ride_aq_join::{CompressionAlgorithm, JoinConfig, JoinError, JoinProcessor};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const TRIP_HEADER: &str = "tripduration,starttime,stoptime,startstationid,startstationname,startstationlatitude,startstationlongitude,endstationid,endstationname,endstationlatitude,endstationlongitude,bikeid,usertype,birthyear,gender";

const AIR_QUALITY_HEADER: &str = "Date,Source,Site ID,POC,Daily Mean PM2.5 Concentration,UNITS,Daily AQI Value,Local Site Name,Daily Obs Count,Percent Complete,AQS Parameter Code,AQS Parameter Desc,CBSA Code,CBSA Name,State Code,State,County Code,County,Site Latitude,Site Longitude";

fn write_file(dir: &TempDir, name: &str, header: &str, rows: &[String]) -> PathBuf {
    let path = dir.path().join(name);
    let mut content = format!("{header}\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(&path, content).unwrap();
    path
}

fn trip_row(duration: u32, start: &str, station: u32, lat: f64, lon: f64) -> String {
    format!(
        "{duration},{start},2019-07-09 09:00:00,{station},W 21 St & 6 Ave,{lat},{lon},3255,8 Ave & W 31 St,40.7505,-73.9946,33456,Subscriber,1985,1"
    )
}

fn reading_row(
    date: &str,
    pm25: &str,
    aqi: &str,
    site: &str,
    county: &str,
    lat: f64,
    lon: f64,
) -> String {
    format!(
        "{date},AQS,360810124,1,{pm25},ug/m3 LC,{aqi},{site},1,100,88101,PM2.5 - Local Conditions,35620,New York-Newark-Jersey City,36,New York,081,{county},{lat},{lon}"
    )
}

fn sites_for(date: &str) -> Vec<String> {
    vec![
        reading_row(date, "7.1", "30", "Queens College 2", "Queens", 40.73614, -73.82153),
        reading_row(date, "9.4", "39", "IS 52", "Bronx", 40.81618, -73.90200),
        reading_row(date, "8.2", "34", "PS 19", "New York", 40.73000, -73.98446),
        reading_row(date, "", "", "Division Street", "New York", 40.71436, -73.99518),
    ]
}

fn setup(dir: &TempDir) -> (Vec<PathBuf>, PathBuf) {
    let trips_2017 = write_file(
        dir,
        "2017_citibike_morning_rush_07_09.csv",
        TRIP_HEADER,
        &[
            trip_row(540, "2017-07-09 07:01:12", 212, 40.74395, -73.99144),
            trip_row(813, "2017-07-09 07:20:40", 3263, 40.72938, -73.99098),
        ],
    );
    let trips_2019 = write_file(
        dir,
        "2019_citibike_morning_rush_07_09.csv",
        TRIP_HEADER,
        &[
            trip_row(402, "2019-07-09 08:15:00.1230", 79, 40.71912, -74.00667),
            trip_row(1210, "2019-07-09 08:44:31", 3142, 40.81000, -73.90500),
            trip_row(1210, "07/09/2019 08:44", 3142, 40.81000, -73.90500),
        ],
    );

    let mut readings = sites_for("07/09/2017");
    readings.extend(sites_for("07/09/2019"));
    readings.push(reading_row(
        "07/09/2019",
        "11.0",
        "46",
        "IS 52",
        "Bronx",
        40.81618,
        -73.90200,
    ));
    let air_quality = write_file(dir, "Air_Quality.csv", AIR_QUALITY_HEADER, &readings);

    (vec![trips_2017, trips_2019], air_quality)
}

#[tokio::test]
async fn test_end_to_end_join() {
    let dir = TempDir::new().unwrap();
    let (trips, air_quality) = setup(&dir);
    let output = dir.path().join("joined_output");

    let mut processor = JoinProcessor::new(trips, air_quality, output.clone())
        .unwrap()
        .with_config(
            JoinConfig::default()
                .with_workers(2)
                .with_max_records_per_file(3)
                .with_compression(CompressionAlgorithm::Uncompressed)
                .with_preview(5, 5),
        );
    let stats = processor.process().await.unwrap();

    assert_eq!(stats.trips_loaded, 5);
    assert_eq!(stats.trips_without_date, 1);
    assert_eq!(stats.readings_loaded, 9);
    assert_eq!(stats.site_day_aggregates, 8);
    assert_eq!(stats.matched_trips, 4);
    assert_eq!(stats.files_written, 2);
    assert_eq!(list_part_files(&output).unwrap().len(), 2);

    let matches = read_matches(&output).unwrap();
    assert_eq!(matches.len(), 4);
    assert!(matches.windows(2).all(|w| w[0].ride_id < w[1].ride_id));

    let sites: Vec<_> = matches
        .iter()
        .map(|m| m.local_site_name.as_deref().unwrap())
        .collect();
    assert_eq!(sites, vec!["PS 19", "PS 19", "Division Street", "IS 52"]);

    // Division Street never reported a value, so its means stay null
    assert_eq!(matches[2].avg_pm25, None);
    assert_eq!(matches[2].avg_aqi, None);

    // Two IS 52 readings on 2019-07-09 average to (9.4 + 11.0) / 2
    assert!((matches[3].avg_pm25.unwrap() - 10.2).abs() < 1e-9);
    assert_eq!(matches[3].avg_aqi, Some(42.5));

    let total: usize = processor.site_counts().iter().map(|c| c.ride_count).sum();
    assert_eq!(total, matches.len());
}

#[tokio::test]
async fn test_glob_trip_input() {
    let dir = TempDir::new().unwrap();
    let (_, air_quality) = setup(&dir);
    let output = dir.path().join("joined_output");
    let pattern = dir.path().join("*_citibike_*.csv");

    let stats = JoinProcessor::new(vec![pattern], air_quality, output)
        .unwrap()
        .with_config(JoinConfig::default().with_preview(0, 0))
        .process()
        .await
        .unwrap();

    assert_eq!(stats.trip_files, 2);
    assert_eq!(stats.matched_trips, 4);
}

#[tokio::test]
async fn test_missing_air_quality_file() {
    let dir = TempDir::new().unwrap();
    let (trips, _) = setup(&dir);
    let missing = dir.path().join("Air_Quality_2020.csv");

    let result = JoinProcessor::new(trips, missing.clone(), dir.path().join("out"))
        .unwrap()
        .process()
        .await;

    match result {
        Err(JoinError::DatasetNotFound { path }) => assert_eq!(path, missing),
        other => panic!("Expected DatasetNotFound, got {other:?}"),
    }
}
