//! Parquet sink for matched trips
//!
//! Writes the matched trips into a directory of `part-NNNNN.parquet` files
//! holding at most `max_records_per_file` rows each. The destination is
//! replaced on every run. A matching reader turns an output directory back
//! into `MatchedTrip` records.

use crate::config::JoinConfig;
use crate::constants::{OUTPUT_FILE_PREFIX, PARQUET_EXTENSION, fields};
use crate::error::{JoinError, Result};
use crate::models::{MatchedTrip, WriteSummary};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{
    Column, DataFrame, DataType, ParquetReader, ParquetWriter, SerReader, StatisticsOptions,
    TimeUnit,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Days between 0001-01-01 (day 1 of the common era) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_to_epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn epoch_days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_DAYS_FROM_CE)
}

fn timestamp_to_micros(timestamp: NaiveDateTime) -> i64 {
    timestamp.and_utc().timestamp_micros()
}

fn micros_to_timestamp(micros: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc())
}

/// Writer for the matched-trip output directory
#[derive(Debug)]
pub struct MatchWriter {
    output_path: PathBuf,
    config: JoinConfig,
}

impl MatchWriter {
    /// Create a new writer
    pub fn new(output_path: PathBuf, config: JoinConfig) -> Self {
        Self {
            output_path,
            config,
        }
    }

    /// Output directory this writer replaces
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Replace the output directory with the given matches
    pub fn write(&self, matches: &[MatchedTrip]) -> Result<WriteSummary> {
        self.reset_output_dir()?;

        let max_records = self.config.max_records_per_file.max(1);
        let mut summary = WriteSummary::default();

        for (part, chunk) in matches.chunks(max_records).enumerate() {
            let path = self.part_path(part);
            let mut df = matches_to_frame(chunk)?;
            self.write_frame(&mut df, &path)?;

            debug!("Wrote {} rows to {}", chunk.len(), path.display());
            summary.files_written += 1;
            summary.rows_written += chunk.len();
        }

        Ok(summary)
    }

    fn reset_output_dir(&self) -> Result<()> {
        if self.output_path.is_dir() {
            debug!("Removing previous output at {}", self.output_path.display());
            fs::remove_dir_all(&self.output_path)?;
        } else if self.output_path.exists() {
            fs::remove_file(&self.output_path)?;
        }
        fs::create_dir_all(&self.output_path)?;
        Ok(())
    }

    fn part_path(&self, part: usize) -> PathBuf {
        self.output_path.join(format!(
            "{}-{:05}.{}",
            OUTPUT_FILE_PREFIX, part, PARQUET_EXTENSION
        ))
    }

    fn write_frame(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        let file = fs::File::create(path)?;
        let statistics = if self.config.enable_statistics {
            StatisticsOptions::full()
        } else {
            StatisticsOptions::empty()
        };

        ParquetWriter::new(file)
            .with_compression(self.config.compression.to_polars_compression())
            .with_statistics(statistics)
            .finish(df)
            .map_err(|e| JoinError::ProcessingFailed {
                path: path.to_path_buf(),
                reason: format!("Failed to write parquet: {}", e),
            })?;

        Ok(())
    }
}

/// Build the output frame for a slice of matches
pub fn matches_to_frame(matches: &[MatchedTrip]) -> Result<DataFrame> {
    let text = |get: fn(&MatchedTrip) -> &Option<String>| -> Vec<Option<String>> {
        matches.iter().map(|m| get(m).clone()).collect()
    };
    let float = |get: fn(&MatchedTrip) -> Option<f64>| -> Vec<Option<f64>> {
        matches.iter().map(get).collect()
    };

    let timestamps: Vec<Option<i64>> = matches
        .iter()
        .map(|m| m.trip_start_timestamp.map(timestamp_to_micros))
        .collect();
    let dates: Vec<Option<i32>> = matches
        .iter()
        .map(|m| m.date.map(date_to_epoch_days))
        .collect();
    let ride_ids: Vec<i64> = matches.iter().map(|m| m.ride_id).collect();
    let distances: Vec<f64> = matches.iter().map(|m| m.squared_distance).collect();

    let columns = vec![
        Column::new(fields::TRIP_DURATION.into(), text(|m| &m.trip_duration)),
        Column::new(fields::START_STATION_ID.into(), text(|m| &m.start_station_id)),
        Column::new(
            fields::START_STATION_LATITUDE.into(),
            float(|m| m.start_station_latitude),
        ),
        Column::new(
            fields::START_STATION_LONGITUDE.into(),
            float(|m| m.start_station_longitude),
        ),
        Column::new(fields::END_STATION_ID.into(), text(|m| &m.end_station_id)),
        Column::new(fields::USER_TYPE.into(), text(|m| &m.user_type)),
        Column::new(fields::TRIP_START_TIMESTAMP.into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?,
        Column::new(fields::RIDE_ID.into(), ride_ids),
        Column::new(fields::LOCAL_SITE_NAME.into(), text(|m| &m.local_site_name)),
        Column::new(fields::COUNTY.into(), text(|m| &m.county)),
        Column::new(fields::DATE.into(), dates).cast(&DataType::Date)?,
        Column::new(fields::SITE_LATITUDE.into(), float(|m| m.site_latitude)),
        Column::new(fields::SITE_LONGITUDE.into(), float(|m| m.site_longitude)),
        Column::new(fields::AVG_PM25.into(), float(|m| m.avg_pm25)),
        Column::new(fields::AVG_AQI.into(), float(|m| m.avg_aqi)),
        Column::new(fields::SQUARED_DISTANCE.into(), distances),
    ];

    Ok(DataFrame::new(columns)?)
}

/// Convert an output frame back into matches
pub fn frame_to_matches(df: &DataFrame) -> Result<Vec<MatchedTrip>> {
    let text = |name: &str| -> Result<Vec<Option<String>>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    };
    let float = |name: &str| -> Result<Vec<Option<f64>>> {
        Ok(df
            .column(name)?
            .as_materialized_series()
            .f64()?
            .into_iter()
            .collect())
    };

    let durations = text(fields::TRIP_DURATION)?;
    let start_ids = text(fields::START_STATION_ID)?;
    let start_lats = float(fields::START_STATION_LATITUDE)?;
    let start_lons = float(fields::START_STATION_LONGITUDE)?;
    let end_ids = text(fields::END_STATION_ID)?;
    let user_types = text(fields::USER_TYPE)?;
    let site_names = text(fields::LOCAL_SITE_NAME)?;
    let counties = text(fields::COUNTY)?;
    let site_lats = float(fields::SITE_LATITUDE)?;
    let site_lons = float(fields::SITE_LONGITUDE)?;
    let avg_pm25 = float(fields::AVG_PM25)?;
    let avg_aqi = float(fields::AVG_AQI)?;
    let distances = float(fields::SQUARED_DISTANCE)?;

    let timestamps: Vec<Option<i64>> = df
        .column(fields::TRIP_START_TIMESTAMP)?
        .cast(&DataType::Int64)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .collect();
    let dates: Vec<Option<i32>> = df
        .column(fields::DATE)?
        .cast(&DataType::Int32)?
        .as_materialized_series()
        .i32()?
        .into_iter()
        .collect();
    let ride_ids: Vec<Option<i64>> = df
        .column(fields::RIDE_ID)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .collect();

    let mut matches = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let (Some(ride_id), Some(squared_distance)) = (ride_ids[row], distances[row]) else {
            return Err(JoinError::ProcessingFailed {
                path: PathBuf::new(),
                reason: format!("Row {} has a null ride_id or squared_distance", row),
            });
        };

        matches.push(MatchedTrip {
            trip_duration: durations[row].clone(),
            start_station_id: start_ids[row].clone(),
            start_station_latitude: start_lats[row],
            start_station_longitude: start_lons[row],
            end_station_id: end_ids[row].clone(),
            user_type: user_types[row].clone(),
            trip_start_timestamp: timestamps[row].and_then(micros_to_timestamp),
            ride_id,
            local_site_name: site_names[row].clone(),
            county: counties[row].clone(),
            date: dates[row].and_then(epoch_days_to_date),
            site_latitude: site_lats[row],
            site_longitude: site_lons[row],
            avg_pm25: avg_pm25[row],
            avg_aqi: avg_aqi[row],
            squared_distance,
        });
    }

    Ok(matches)
}

/// Output part files of a directory in name order
pub fn list_part_files(output_path: &Path) -> Result<Vec<PathBuf>> {
    let mut parts = Vec::new();
    for entry in fs::read_dir(output_path)? {
        let path = entry?.path();
        if path
            .extension()
            .is_some_and(|ext| ext == PARQUET_EXTENSION)
        {
            parts.push(path);
        }
    }
    parts.sort();
    Ok(parts)
}

/// Reload every matched trip from an output directory
pub fn read_matches(output_path: &Path) -> Result<Vec<MatchedTrip>> {
    if !output_path.is_dir() {
        return Err(JoinError::DatasetNotFound {
            path: output_path.to_path_buf(),
        });
    }

    let mut matches = Vec::new();
    for path in list_part_files(output_path)? {
        let file = fs::File::open(&path)?;
        let df = ParquetReader::new(file).finish()?;
        matches.extend(frame_to_matches(&df)?);
    }
    Ok(matches)
}
