//! Main join engine.
//!
//! Orchestrates one ride / air-quality join run: input discovery, CSV
//! loading, site-day aggregation, the partitioned date join with
//! closest-site ranking, console reporting and parquet persistence.

pub mod aggregate;
pub mod discovery;
pub mod join;
pub mod loader;
pub mod matcher;
pub mod ranking;
pub mod report;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::aggregate::aggregate_site_days;
use self::discovery::InputDiscovery;
use self::join::SiteDateIndex;
use self::loader::{load_readings, load_trips};
use self::matcher::match_trips;
use self::report::{print_match_preview, print_site_counts, site_match_counts};
use self::writer::MatchWriter;

use crate::config::JoinConfig;
use crate::error::{JoinError, Result};
use crate::models::{MatchedTrip, ProcessingStats, SiteMatchCount, WriteSummary};

use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task;
use tracing::{debug, info};

/// Main processor for one join run
#[derive(Debug)]
pub struct JoinProcessor {
    trip_discovery: InputDiscovery,
    air_quality_discovery: InputDiscovery,
    output_path: PathBuf,
    config: JoinConfig,
    site_counts: Vec<SiteMatchCount>,
}

impl JoinProcessor {
    /// Create a new join processor
    pub fn new(
        trip_inputs: Vec<PathBuf>,
        air_quality_input: PathBuf,
        output_path: PathBuf,
    ) -> Result<Self> {
        if trip_inputs.is_empty() {
            return Err(JoinError::Configuration {
                message: "At least one trip input is required".to_string(),
            });
        }

        Ok(Self {
            trip_discovery: InputDiscovery::new(trip_inputs),
            air_quality_discovery: InputDiscovery::new(vec![air_quality_input]),
            output_path,
            config: JoinConfig::default(),
            site_counts: Vec::new(),
        })
    }

    /// Configure the processor
    pub fn with_config(mut self, config: JoinConfig) -> Self {
        self.config = config;
        self
    }

    /// Per-site ride counts of the last completed run
    pub fn site_counts(&self) -> &[SiteMatchCount] {
        &self.site_counts
    }

    /// Main processing entry point
    pub async fn process(&mut self) -> Result<ProcessingStats> {
        let start_time = Instant::now();
        self.config.validate()?;

        println!("{}", "Starting ride / air-quality join".bright_green().bold());
        for input in self.trip_discovery.inputs() {
            println!("  {} {}", "Trips:".bright_cyan(), input.display());
        }
        for input in self.air_quality_discovery.inputs() {
            println!("  {} {}", "Air quality:".bright_cyan(), input.display());
        }
        println!(
            "  {} {}",
            "Output:".bright_cyan(),
            self.output_path.display()
        );

        // Step 1: Discover inputs
        println!("\n{}", "Discovering input files...".bright_yellow());
        let trip_files = self.trip_discovery.discover_csv_files()?;
        let air_quality_files = self.air_quality_discovery.discover_csv_files()?;
        println!(
            "  {} {} trip files and {} air-quality files",
            "Found".bright_green(),
            trip_files.len().to_string().bright_white().bold(),
            air_quality_files.len().to_string().bright_white().bold()
        );

        // Step 2: Load and normalize both sources
        println!("\n{}", "Loading sources...".bright_yellow());
        let trips = load_trips(&trip_files, self.config.max_concurrent_files).await?;
        let readings = load_readings(&air_quality_files).await?;
        let trips_loaded = trips.len();
        let trips_without_date = trips.iter().filter(|t| t.date_key().is_none()).count();
        info!(
            "Loaded {} trips ({} without a usable start date) and {} air-quality readings",
            trips_loaded,
            trips_without_date,
            readings.len()
        );

        // Step 3: Aggregate readings per site and date
        let readings_loaded = readings.len();
        let aggregates = task::spawn_blocking(move || aggregate_site_days(&readings))
            .await
            .map_err(|e| JoinError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Aggregation task failed: {}", e),
            })?;
        let site_day_aggregates = aggregates.len();
        let index = Arc::new(SiteDateIndex::new(aggregates));
        info!(
            "Built {} site-day aggregates over {} dates",
            site_day_aggregates,
            index.date_count()
        );
        if index.undated_count() > 0 {
            debug!(
                "{} aggregates have no date and can never match",
                index.undated_count()
            );
        }

        // Step 4: Join on date and keep the closest site per ride
        println!("\n{}", "Matching trips to monitoring sites...".bright_yellow());
        let outcome = match_trips(trips, index, self.config.workers).await?;
        info!(
            "Ranked {} candidate pairs into {} matched trips",
            outcome.candidate_pairs,
            outcome.matches.len()
        );

        // Step 5: Report
        self.site_counts = site_match_counts(&outcome.matches);
        print_match_preview(&outcome.matches, self.config.preview_rows);
        print_site_counts(&self.site_counts, self.config.preview_site_counts);

        // Step 6: Persist
        println!("\n{}", "Writing parquet output...".bright_yellow());
        let matched_trips = outcome.matches.len();
        let summary = self.write_matches(outcome.matches).await?;

        let total_time = start_time.elapsed().as_millis();
        let stats = ProcessingStats {
            trip_files: trip_files.len(),
            air_quality_files: air_quality_files.len(),
            trips_loaded,
            trips_without_date,
            readings_loaded,
            site_day_aggregates,
            candidate_pairs: outcome.candidate_pairs,
            matched_trips,
            files_written: summary.files_written,
            output_path: self.output_path.clone(),
            processing_time_ms: total_time,
        };
        print_summary(&stats);

        Ok(stats)
    }

    async fn write_matches(&self, matches: Vec<MatchedTrip>) -> Result<WriteSummary> {
        let writer = MatchWriter::new(self.output_path.clone(), self.config.clone());
        let summary = task::spawn_blocking(move || writer.write(&matches))
            .await
            .map_err(|e| JoinError::ProcessingFailed {
                path: self.output_path.clone(),
                reason: format!("Write task failed: {}", e),
            })??;

        info!(
            "Wrote {} rows to {} files under {}",
            summary.rows_written,
            summary.files_written,
            self.output_path.display()
        );
        Ok(summary)
    }
}

fn print_summary(stats: &ProcessingStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Trips loaded:".bright_cyan(),
        stats.trips_loaded.to_string().bright_white()
    );
    if stats.trips_without_date > 0 {
        println!(
            "  {} {}",
            "Trips without date:".bright_red(),
            stats.trips_without_date.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {}",
        "Readings loaded:".bright_cyan(),
        stats.readings_loaded.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Site-day aggregates:".bright_cyan(),
        stats.site_day_aggregates.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Matched trips:".bright_cyan(),
        stats.matched_trips.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Files written:".bright_cyan(),
        stats.files_written.to_string().bright_white()
    );
}
