//! Input discovery for trip and air-quality sources
//!
//! Each input argument may name a single CSV file, a directory (searched
//! recursively for `.csv` files) or a glob pattern. The expanded list is
//! sorted within each argument so repeated runs read files in the same
//! order.

use crate::constants::CSV_EXTENSION;
use crate::error::{JoinError, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File discovery component for join inputs
#[derive(Debug, Clone)]
pub struct InputDiscovery {
    inputs: Vec<PathBuf>,
}

impl InputDiscovery {
    /// Create a discovery over the given input arguments
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self { inputs }
    }

    /// Input arguments as given
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Expand every input into CSV files, dropping duplicates while keeping
    /// the first occurrence
    pub fn discover_csv_files(&self) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for input in &self.inputs {
            for file in expand_input(input)? {
                if seen.insert(file.clone()) {
                    files.push(file);
                }
            }
        }

        debug!(
            "Discovered {} CSV files from {} inputs",
            files.len(),
            self.inputs.len()
        );
        Ok(files)
    }
}

fn expand_input(input: &Path) -> Result<Vec<PathBuf>> {
    let text = input.to_string_lossy();

    if is_glob_pattern(&text) {
        return expand_glob(&text);
    }

    if input.is_dir() {
        return walk_directory(input);
    }

    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    Err(JoinError::DatasetNotFound {
        path: input.to_path_buf(),
    })
}

fn is_glob_pattern(text: &str) -> bool {
    text.contains(['*', '?', '['])
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).map_err(|e| JoinError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.msg.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| JoinError::Io(e.into()))?;
        if path.is_dir() {
            files.extend(walk_directory(&path)?);
        } else if is_csv_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(JoinError::NoInputFiles {
            pattern: pattern.to_string(),
        });
    }
    Ok(files)
}

fn walk_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    debug!("Searching for CSV files in: {}", dir.display());

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = entry?;
        if entry.file_type().is_file() && is_csv_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(JoinError::NoInputFiles {
            pattern: dir.display().to_string(),
        });
    }
    Ok(files)
}

/// Check if a path has a `.csv` extension (case-insensitive)
pub fn is_csv_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
}
