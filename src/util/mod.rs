//! Utility functions module
//!
//! Contains helpers for size and duration formatting and the throughput
//! calculation shared by both benchmark phases.

pub mod units;

// Re-export commonly used functions
pub use units::{
    bytes_to_megabytes, calculate_throughput_mbps, format_bytes, format_duration, parse_bytes,
    MEASUREMENT_EPSILON,
};
