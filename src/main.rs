use anyhow::Context;
use clap::Parser;
use ride_aq_join::JoinError;
use ride_aq_join::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    let runtime = match build_runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            // Without a signal handler the run simply cannot be interrupted
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, aborting join...");
                Err(JoinError::ProcessingInterrupted {
                    reason: "Processing interrupted by user".to_string(),
                })
            }
        }
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

fn build_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")
}
