//! Units formatting and conversion utilities
//!
//! Sizes go through `byte-unit`, durations through `humantime`. Throughput
//! uses 1 MB = 1,048,576 bytes to match the report lines.

use crate::BYTES_PER_MB;
use byte_unit::{Byte, UnitType};
use std::time::Duration;

/// Elapsed times at or below this are too short to turn into a speed
pub const MEASUREMENT_EPSILON: Duration = Duration::from_micros(1);

/// Calculate throughput in MB/s from bytes and duration
///
/// Returns `None` when the duration is at or below [`MEASUREMENT_EPSILON`].
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use diskbench::util::units::calculate_throughput_mbps;
///
/// let throughput = calculate_throughput_mbps(1048576, Duration::from_secs(1)).unwrap();
/// assert!((throughput - 1.0).abs() < 0.01);
/// assert!(calculate_throughput_mbps(1048576, Duration::ZERO).is_none());
/// ```
pub fn calculate_throughput_mbps(bytes: u64, duration: Duration) -> Option<f64> {
    if duration <= MEASUREMENT_EPSILON {
        return None;
    }

    Some(bytes_to_megabytes(bytes) / duration.as_secs_f64())
}

/// Bytes expressed in MB (1,048,576 bytes each)
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Format bytes into a human-readable binary size, e.g. `1.50 MiB`
pub fn format_bytes(bytes: u64) -> String {
    let adjusted = Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary);
    format!("{:.2}", adjusted)
}

/// Parse a size such as `4096`, `64KiB` or `1 MiB` into bytes
///
/// # Examples
/// ```
/// use diskbench::util::units::parse_bytes;
///
/// assert_eq!(parse_bytes("1MiB").unwrap(), 1048576);
/// assert_eq!(parse_bytes("4096").unwrap(), 4096);
/// ```
pub fn parse_bytes(input: &str) -> Result<u64, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Size must not be empty".to_string());
    }

    Byte::parse_str(input, true)
        .map(|byte| byte.as_u64())
        .map_err(|e| format!("Invalid size '{}': {}", input, e))
}

/// Format duration into human-readable string
pub fn format_duration(duration: Duration) -> String {
    humantime::format_duration(duration).to_string()
}
