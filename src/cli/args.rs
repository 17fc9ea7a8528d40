//! Command-line argument definitions for the ride / air-quality join
//!
//! Three optional positional arguments select the inputs and the output
//! directory. When any of them is missing the whole set falls back to the
//! built-in defaults, so a bare invocation joins the standard summer
//! citibike extracts against `Air_Quality.csv`.

use crate::config::{CompressionAlgorithm, JoinConfig};
use crate::constants::{
    DEFAULT_AIR_QUALITY_PATH, DEFAULT_MAX_RECORDS_PER_FILE, DEFAULT_OUTPUT_PATH,
    DEFAULT_PREVIEW_ROWS, DEFAULT_PREVIEW_SITE_COUNTS, DEFAULT_TRIP_PATHS,
};
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the ride / air-quality join
///
/// Joins bicycle trip records to the closest air-quality monitoring site
/// reporting on the same calendar date and writes the result as Parquet.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ride_aq_join",
    version,
    about = "Join bike-share trips to the nearest same-day air-quality reading",
    long_about = "Reads one or more bike-share trip CSV files and a daily air-quality CSV file, \
                  averages PM2.5 and AQI per monitoring site and day, matches every trip to the \
                  closest site reporting on its start date and writes the matches as Parquet."
)]
pub struct Args {
    /// Comma-separated trip CSV files, directories or glob patterns
    #[arg(value_name = "TRIP_PATHS")]
    pub trip_paths: Option<String>,

    /// Air-quality CSV file
    #[arg(value_name = "AIR_QUALITY_PATH")]
    pub air_quality_path: Option<PathBuf>,

    /// Output directory, replaced on every run
    #[arg(value_name = "OUTPUT_PATH")]
    pub output_path: Option<PathBuf>,

    /// Maximum records per output parquet file
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_RECORDS_PER_FILE)]
    pub max_records_per_file: usize,

    /// Parquet compression algorithm (snappy, zstd, lz4, none)
    #[arg(long, default_value = "snappy")]
    pub compression: String,

    /// Number of partitions used by the join (defaults to the CPU count)
    #[arg(short, long, value_name = "N")]
    pub workers: Option<usize>,

    /// Matched trips printed after the join
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PREVIEW_ROWS)]
    pub preview_rows: usize,

    /// Per-site ride counts printed after the join
    #[arg(long, value_name = "N", default_value_t = DEFAULT_PREVIEW_SITE_COUNTS)]
    pub preview_sites: usize,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Input and output locations for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPaths {
    pub trip_inputs: Vec<PathBuf>,
    pub air_quality_input: PathBuf,
    pub output_path: PathBuf,
    /// True when the positional arguments were incomplete
    pub used_defaults: bool,
}

impl Args {
    /// Resolve the positional arguments, substituting all defaults when any
    /// of the three is missing
    pub fn resolve_paths(&self) -> ResolvedPaths {
        let trip_inputs = self.trip_paths.as_deref().map(split_trip_paths);

        match (trip_inputs, &self.air_quality_path, &self.output_path) {
            (Some(trip_inputs), Some(air_quality), Some(output)) if !trip_inputs.is_empty() => {
                ResolvedPaths {
                    trip_inputs,
                    air_quality_input: air_quality.clone(),
                    output_path: output.clone(),
                    used_defaults: false,
                }
            }
            _ => ResolvedPaths {
                trip_inputs: DEFAULT_TRIP_PATHS.iter().map(PathBuf::from).collect(),
                air_quality_input: PathBuf::from(DEFAULT_AIR_QUALITY_PATH),
                output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
                used_defaults: true,
            },
        }
    }

    /// Build the run configuration from the tuning flags
    pub fn to_config(&self) -> Result<JoinConfig> {
        let compression: CompressionAlgorithm = self.compression.parse()?;
        let mut config = JoinConfig::default()
            .with_max_records_per_file(self.max_records_per_file)
            .with_compression(compression)
            .with_preview(self.preview_rows, self.preview_sites);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config.validate()?;
        Ok(config)
    }

    /// Determine the log level based on the verbosity flag
    pub fn get_log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}

fn split_trip_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}
