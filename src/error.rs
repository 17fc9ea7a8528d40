//! Error handling for ride / air-quality join operations.
//!
//! Provides error types with context for input discovery, schema
//! validation, and Parquet persistence failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JoinError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Input not found at path: {path}")]
    DatasetNotFound { path: PathBuf },

    #[error("No CSV files matched input: {pattern}")]
    NoInputFiles { pattern: String },

    #[error("Invalid input pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error(
        "Schema mismatch in {source_name} file {path}: missing required columns [{}]",
        .missing.join(", ")
    )]
    SchemaMismatch {
        source_name: String,
        path: PathBuf,
        missing: Vec<String>,
    },

    #[error("Directory traversal failed: {0}")]
    DirectoryTraversal(#[from] walkdir::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Processing failed for {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

pub type Result<T> = std::result::Result<T, JoinError>;
