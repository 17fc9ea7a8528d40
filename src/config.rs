//! Run configuration.
//!
//! One `JoinConfig` is created per run and handed to the processor; it
//! carries every tunable the pipeline stages read (concurrency, output
//! file sizing, compression and console preview limits).

use crate::constants::{
    DEFAULT_MAX_RECORDS_PER_FILE, DEFAULT_PREVIEW_ROWS, DEFAULT_PREVIEW_SITE_COUNTS,
};
use crate::error::{JoinError, Result};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = JoinError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "snappy" => Ok(CompressionAlgorithm::Snappy),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "lz4" => Ok(CompressionAlgorithm::Lz4),
            "none" | "uncompressed" => Ok(CompressionAlgorithm::Uncompressed),
            other => Err(JoinError::Configuration {
                message: format!(
                    "Unknown compression '{}' (expected snappy, zstd, lz4 or none)",
                    other
                ),
            }),
        }
    }
}

/// Configuration for one join run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Number of partitions the join and ranking stages are split across
    pub workers: usize,

    /// Maximum trip files read concurrently
    pub max_concurrent_files: usize,

    /// Maximum records per output parquet file
    pub max_records_per_file: usize,

    /// Parquet compression algorithm
    pub compression: CompressionAlgorithm,

    /// Enable column statistics in written parquet files
    pub enable_statistics: bool,

    /// Matched trips printed in the console preview
    pub preview_rows: usize,

    /// Per-site counts printed in the console preview
    pub preview_site_counts: usize,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get().max(1),
            max_concurrent_files: 4,
            max_records_per_file: DEFAULT_MAX_RECORDS_PER_FILE,
            compression: CompressionAlgorithm::Snappy,
            enable_statistics: true,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            preview_site_counts: DEFAULT_PREVIEW_SITE_COUNTS,
        }
    }
}

impl JoinConfig {
    /// Create configuration with custom worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set maximum concurrent files
    pub fn with_max_concurrent_files(mut self, max_files: usize) -> Self {
        self.max_concurrent_files = max_files;
        self
    }

    /// Set maximum records per output file
    pub fn with_max_records_per_file(mut self, max_records: usize) -> Self {
        self.max_records_per_file = max_records;
        self
    }

    /// Set output compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    /// Set console preview sizes
    pub fn with_preview(mut self, rows: usize, site_counts: usize) -> Self {
        self.preview_rows = rows;
        self.preview_site_counts = site_counts;
        self
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(JoinError::Configuration {
                message: "workers must be at least 1".to_string(),
            });
        }
        if self.max_concurrent_files == 0 {
            return Err(JoinError::Configuration {
                message: "max_concurrent_files must be at least 1".to_string(),
            });
        }
        if self.max_records_per_file == 0 {
            return Err(JoinError::Configuration {
                message: "max_records_per_file must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
