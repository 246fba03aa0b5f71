//! Run history persistence
//!
//! Appends run reports to a JSON file and keeps the newest
//! `MAX_RESULTS_HISTORY` of them.

use crate::models::RunReport;
use crate::{DiskBenchError, Result, APP_NAME, MAX_RESULTS_HISTORY, RESULTS_FILE};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Results storage manager
#[derive(Debug)]
pub struct ResultsStorage {
    results_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ResultsFile {
    version: u32,
    results: Vec<RunReport>,
}

impl ResultsStorage {
    /// Storage at the standard location
    pub fn new() -> Result<Self> {
        Ok(Self::at(Self::results_file_path()?))
    }

    /// Storage backed by an explicit file
    pub fn at(results_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
        }
    }

    /// Uses $DATA_HOME/diskbench/results.json
    pub fn results_file_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            DiskBenchError::PersistenceError("Unable to determine data directory".to_string())
        })?;

        Ok(data_dir.join(APP_NAME).join(RESULTS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.results_path
    }

    /// Load all reports, oldest first
    pub fn load_results(&self) -> Result<Vec<RunReport>> {
        if !self.results_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.results_path).map_err(|e| {
            DiskBenchError::PersistenceError(format!(
                "Failed to read results file {}: {}",
                self.results_path.display(),
                e
            ))
        })?;

        let results_file: ResultsFile = serde_json::from_str(&content)?;
        Ok(results_file.results)
    }

    /// Append a report, dropping the oldest beyond the history limit
    pub fn append_result(&self, report: RunReport) -> Result<()> {
        let mut results = self.load_results()?;
        results.push(report);

        if results.len() > MAX_RESULTS_HISTORY {
            let excess = results.len() - MAX_RESULTS_HISTORY;
            results.drain(..excess);
        }

        self.save_results(results)
    }

    /// The newest `count` reports, oldest first
    pub fn recent_results(&self, count: usize) -> Result<Vec<RunReport>> {
        let mut results = self.load_results()?;
        let skip = results.len().saturating_sub(count);
        results.drain(..skip);
        Ok(results)
    }

    fn save_results(&self, results: Vec<RunReport>) -> Result<()> {
        if let Some(parent) = self.results_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DiskBenchError::PersistenceError(format!(
                    "Failed to create results directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string_pretty(&ResultsFile {
            version: 1,
            results,
        })?;

        fs::write(&self.results_path, content).map_err(|e| {
            DiskBenchError::PersistenceError(format!(
                "Failed to write results file {}: {}",
                self.results_path.display(),
                e
            ))
        })
    }
}
