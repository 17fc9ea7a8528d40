//! Command execution for the join CLI
//!
//! Sets up logging, resolves paths and configuration, then drives one
//! `JoinProcessor` run.

use crate::cli::args::Args;
use crate::error::{JoinError, Result};
use crate::models::ProcessingStats;
use crate::processor::JoinProcessor;
use tracing::{debug, info, warn};

/// Run one join with the given arguments
pub async fn run(args: Args) -> Result<ProcessingStats> {
    setup_logging(&args)?;
    debug!("Command line arguments: {:?}", args);

    let config = args.to_config()?;
    debug!("Run configuration: {:?}", config);

    let paths = args.resolve_paths();
    if paths.used_defaults {
        warn!(
            "Incomplete arguments; expected <trip_paths> <air_quality_path> <output_path>. \
             Using defaults: trips={:?} air_quality={} output={}",
            paths.trip_inputs,
            paths.air_quality_input.display(),
            paths.output_path.display()
        );
    }

    let mut processor =
        JoinProcessor::new(paths.trip_inputs, paths.air_quality_input, paths.output_path)?
            .with_config(config);
    let stats = processor.process().await?;

    info!(
        "Join finished: {} matched trips written to {} in {}ms",
        stats.matched_trips,
        stats.output_path.display(),
        stats.processing_time_ms
    );
    Ok(stats)
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ride_aq_join={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| JoinError::Configuration {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}
