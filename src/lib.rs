//! diskbench - sequential disk throughput benchmark
//!
//! Writes a fixed-size file block by block with a durability flush, reads it
//! back sequentially, and reports the achieved MB/s for both directions.

use std::fmt;
use std::path::PathBuf;

pub mod bench;
pub mod cli;
pub mod config;
pub mod io;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum DiskBenchError {
    /// Target file could not be opened in the requested mode
    OpenError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A write call transferred fewer bytes than the block size
    PartialWrite {
        /// Bytes the failing call was asked to write
        requested: usize,
        /// Bytes the failing call actually wrote
        transferred: usize,
        /// Bytes on disk, including the short write
        total_written: u64,
    },
    /// Removing the benchmark file failed after the run
    CleanupError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Any other I/O failure during write, flush or read
    Io(std::io::Error),
    /// Configuration validation or parsing error
    ConfigError(String),
    /// Results history could not be read or written
    PersistenceError(String),
}

impl fmt::Display for DiskBenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskBenchError::OpenError { path, source } => {
                write!(f, "cannot open {}: {}", path.display(), source)
            }
            DiskBenchError::PartialWrite {
                requested,
                transferred,
                total_written,
            } => write!(
                f,
                "short write of {} of {} bytes ({} bytes written in total)",
                transferred, requested, total_written
            ),
            DiskBenchError::CleanupError { path, source } => {
                write!(f, "cannot remove {}: {}", path.display(), source)
            }
            DiskBenchError::Io(err) => write!(f, "I/O error: {}", err),
            DiskBenchError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            DiskBenchError::PersistenceError(msg) => {
                write!(f, "Results persistence error: {}", msg)
            }
        }
    }
}

impl std::error::Error for DiskBenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiskBenchError::OpenError { source, .. } => Some(source),
            DiskBenchError::CleanupError { source, .. } => Some(source),
            DiskBenchError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DiskBenchError {
    fn from(err: std::io::Error) -> Self {
        DiskBenchError::Io(err)
    }
}

impl From<serde_json::Error> for DiskBenchError {
    fn from(err: serde_json::Error) -> Self {
        DiskBenchError::PersistenceError(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for DiskBenchError {
    fn from(err: toml::de::Error) -> Self {
        DiskBenchError::ConfigError(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for DiskBenchError {
    fn from(err: toml::ser::Error) -> Self {
        DiskBenchError::ConfigError(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for diskbench operations
pub type Result<T> = std::result::Result<T, DiskBenchError>;

/// Error handling utilities
pub mod error {
    use super::DiskBenchError;
    use std::io::ErrorKind;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &DiskBenchError) -> String {
        match error {
            DiskBenchError::OpenError { source, .. } => match source.kind() {
                ErrorKind::PermissionDenied => {
                    "Permission denied. Choose a writable location with --file.".to_string()
                }
                ErrorKind::NotFound => {
                    "Path not found. Check that the parent directory exists.".to_string()
                }
                _ => format!("Could not open the benchmark file: {}", source),
            },
            DiskBenchError::PartialWrite { .. } => {
                "The disk accepted less data than requested. It may be full.".to_string()
            }
            DiskBenchError::CleanupError { path, .. } => {
                format!("The benchmark file was left behind at {}. Remove it manually.", path.display())
            }
            DiskBenchError::ConfigError(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            DiskBenchError::PersistenceError(_) => {
                "Failed to save results. Check disk space and permissions.".to_string()
            }
            DiskBenchError::Io(_) => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "diskbench";
pub const CONFIG_FILE: &str = "diskbench.toml";
pub const RESULTS_FILE: &str = "results.json";
pub const DEFAULT_FILE_NAME: &str = "disk_benchmark_test_file.dat";
pub const MAX_RESULTS_HISTORY: usize = 100;

/// Bytes per reported megabyte
pub const BYTES_PER_MB: u64 = 1024 * 1024;
