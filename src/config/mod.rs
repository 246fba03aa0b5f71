//! Configuration management module
//!
//! Handles defaults, validation and the optional TOML config file for
//! benchmark runs.

use crate::{DiskBenchError, Result, APP_NAME, CONFIG_FILE, DEFAULT_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub mod persistence;

/// Benchmark configuration structure containing all test parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Target file written and read back by the benchmark
    pub file_path: PathBuf,
    /// Bytes per write/read call
    pub block_size: u64,
    /// Number of write calls
    pub block_count: u64,
    /// Content of the data block
    pub payload: PayloadKind,
    /// Evict the file from the page cache between write and read
    pub drop_cache: bool,
    /// Show a progress bar while a phase runs
    pub progress: bool,
}

/// Generator for the data block written on every call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Random bytes
    #[default]
    Random,
    /// Repeating 0..=255 byte ramp
    Pattern,
    /// Random little-endian f64 values in [0, 1)
    Float64,
}

impl PayloadKind {
    /// Get a human-readable description of the payload
    pub fn description(&self) -> &'static str {
        match self {
            PayloadKind::Random => "random bytes",
            PayloadKind::Pattern => "byte pattern",
            PayloadKind::Float64 => "float64 column data",
        }
    }
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
            block_size: 1024 * 1024, // 1 MiB
            block_count: 10 * 1024, // 10 GiB total
            payload: PayloadKind::Random,
            drop_cache: false,
            progress: false,
        }
    }
}

/// Benchmark file in the current working directory
pub fn default_file_path() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(DEFAULT_FILE_NAME)
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured total size; informational, the write phase reports the real count
    pub fn target_size(&self) -> u64 {
        self.block_size.saturating_mul(self.block_count)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.file_path.as_os_str().is_empty() {
            return Err(DiskBenchError::ConfigError(
                "File path must not be empty".to_string(),
            ));
        }

        if self.file_path.is_dir() {
            return Err(DiskBenchError::ConfigError(format!(
                "File path is a directory: {}",
                self.file_path.display()
            )));
        }

        if self.block_size == 0 {
            return Err(DiskBenchError::ConfigError(
                "Block size must be greater than 0".to_string(),
            ));
        }

        // The block lives in memory and is handed to a single write call.
        const MAX_BLOCK_SIZE: u64 = 1024 * 1024 * 1024; // 1 GiB
        if self.block_size > MAX_BLOCK_SIZE {
            return Err(DiskBenchError::ConfigError(format!(
                "Block size too large: {} bytes (max: {} bytes)",
                self.block_size, MAX_BLOCK_SIZE
            )));
        }

        if self.block_size.checked_mul(self.block_count).is_none() {
            return Err(DiskBenchError::ConfigError(format!(
                "Total size overflows: {} blocks of {} bytes",
                self.block_count, self.block_size
            )));
        }

        Ok(())
    }

    /// Set the benchmark file path
    pub fn with_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = path.into();
        self
    }

    /// Set the block size for I/O operations
    pub fn with_block_size(mut self, size: u64) -> Self {
        self.block_size = size;
        self
    }

    /// Set the number of blocks written
    pub fn with_block_count(mut self, count: u64) -> Self {
        self.block_count = count;
        self
    }

    /// Set the payload generator
    pub fn with_payload(mut self, payload: PayloadKind) -> Self {
        self.payload = payload;
        self
    }

    /// Set whether the page cache is dropped before reading
    pub fn with_drop_cache(mut self, drop_cache: bool) -> Self {
        self.drop_cache = drop_cache;
        self
    }

    /// Set whether a progress bar is drawn
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DiskBenchError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            DiskBenchError::ConfigError(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Save configuration to an explicit TOML file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DiskBenchError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| {
            DiskBenchError::ConfigError(format!(
                "Failed to write config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/diskbench/diskbench.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DiskBenchError::ConfigError("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
