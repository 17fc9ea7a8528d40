//! Source loading.
//!
//! Reads discovered CSV files on the blocking pool with bounded
//! concurrency, normalizes them and converts them into typed records.
//! Trip files are read in an order-preserving stream so ride identifiers
//! are reproducible for a given input list.

use crate::constants::RIDE_ID_PARTITION_SHIFT;
use crate::error::{JoinError, Result};
use crate::models::{AirQualityReading, TripRecord};
use crate::schema::{
    SourceKind, normalize_frame, read_csv_as_text, readings_from_frame, trips_from_frame,
};

use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;

/// First ride identifier of the file at `file_index`.
///
/// The file index occupies the high bits, so identifiers increase across
/// files and are unique as long as a file holds fewer than 2^33 rows.
pub fn ride_id_base(file_index: usize) -> i64 {
    (file_index as i64) << RIDE_ID_PARTITION_SHIFT
}

/// Load one trip file synchronously
pub fn load_trip_file(path: &Path, file_index: usize) -> Result<Vec<TripRecord>> {
    let raw = read_csv_as_text(path)?;
    let normalized = normalize_frame(raw, SourceKind::Trips, path)?;
    let trips = trips_from_frame(&normalized, ride_id_base(file_index))?;
    debug!("Loaded {} trips from {}", trips.len(), path.display());
    Ok(trips)
}

/// Load one air-quality file synchronously
pub fn load_air_quality_file(path: &Path) -> Result<Vec<AirQualityReading>> {
    let raw = read_csv_as_text(path)?;
    let normalized = normalize_frame(raw, SourceKind::AirQuality, path)?;
    let readings = readings_from_frame(&normalized)?;
    debug!("Loaded {} readings from {}", readings.len(), path.display());
    Ok(readings)
}

/// Load all trip files, at most `max_concurrent` at a time.
///
/// Any schema or I/O failure aborts the whole load.
pub async fn load_trips(files: &[PathBuf], max_concurrent: usize) -> Result<Vec<TripRecord>> {
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.set_message("Loading trip files");

    let per_file: Vec<Vec<TripRecord>> = stream::iter(files.iter().cloned().enumerate())
        .map(|(file_index, path)| {
            let pb = pb.clone();
            async move {
                if let Some(file_name) = path.file_name() {
                    pb.set_message(format!("Loading: {}", file_name.to_string_lossy()));
                }
                let trips = spawn_load(path, move |p| load_trip_file(p, file_index)).await;
                pb.inc(1);
                trips
            }
        })
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await?;

    pb.finish_with_message("Trip files loaded");
    Ok(per_file.into_iter().flatten().collect())
}

/// Load all air-quality files in order
pub async fn load_readings(files: &[PathBuf]) -> Result<Vec<AirQualityReading>> {
    let mut readings = Vec::new();
    for path in files {
        readings.extend(spawn_load(path.clone(), load_air_quality_file).await?);
    }
    Ok(readings)
}

async fn spawn_load<T, F>(path: PathBuf, load: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Path) -> Result<T> + Send + 'static,
{
    let task_path = path.clone();
    task::spawn_blocking(move || load(&task_path))
        .await
        .map_err(|e| JoinError::ProcessingFailed {
            path,
            reason: format!("Load task failed: {}", e),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "tripduration,starttime,startstationid,startstationlatitude,startstationlongitude,endstationid,usertype";

    fn write_trips(dir: &TempDir, name: &str, rows: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        let mut content = format!("{HEADER}\n");
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_ride_id_base() {
        assert_eq!(ride_id_base(0), 0);
        assert_eq!(ride_id_base(1), 1 << 33);
        assert!(ride_id_base(2) > ride_id_base(1));
    }

    #[tokio::test]
    async fn test_ride_ids_unique_across_files() {
        let dir = TempDir::new().unwrap();
        let a = write_trips(
            &dir,
            "a.csv",
            &[
                "600,2019-07-09 08:15:00,72,40.73,-73.99,505,Subscriber",
                "420,2019-07-09 08:20:00,79,40.72,-74.00,3255,Customer",
            ],
        );
        let b = write_trips(
            &dir,
            "b.csv",
            &["300,2018-07-09 07:00:00,82,40.71,-74.01,116,Subscriber"],
        );

        let trips = load_trips(&[a, b], 2).await.unwrap();

        assert_eq!(trips.len(), 3);
        let ids: Vec<i64> = trips.iter().map(|t| t.ride_id).collect();
        assert_eq!(ids, vec![0, 1, 1 << 33]);
        assert_eq!(trips[2].trip_start_date.as_deref(), Some("2018-07-09"));
    }

    #[tokio::test]
    async fn test_schema_error_aborts_load() {
        let dir = TempDir::new().unwrap();
        let good = write_trips(
            &dir,
            "good.csv",
            &["600,2019-07-09 08:15:00,72,40.73,-73.99,505,Subscriber"],
        );
        let bad = dir.path().join("bad.csv");
        fs::write(&bad, "tripduration,starttime\n600,2019-07-09 08:15:00\n").unwrap();

        let result = load_trips(&[good, bad], 2).await;
        assert!(matches!(result, Err(JoinError::SchemaMismatch { .. })));
    }

    #[tokio::test]
    async fn test_load_readings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aq.csv");
        fs::write(
            &path,
            "Date,Daily Mean PM2.5 Concentration,Daily AQI Value,State,County,Site Latitude,Site Longitude,Local Site Name\n\
             07/09/2019,10.0,42,New York,Queens,40.736,-73.822,Queens College\n",
        )
        .unwrap();

        let readings = load_readings(&[path]).await.unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].pm25_concentration, Some(10.0));
    }
}
