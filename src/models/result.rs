//! Benchmark result data models
//!
//! Contains the per-phase measurements and the report of a whole
//! write/read/cleanup run.

use crate::config::BenchmarkConfig;
use crate::util::units::{calculate_throughput_mbps, format_bytes};
use crate::{error, DiskBenchError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which half of the benchmark produced a measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Write,
    Read,
}

impl Phase {
    /// Capitalised name used in report lines
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Write => "Write",
            Phase::Read => "Read",
        }
    }
}

/// Achieved speed, or a marker when the phase finished too fast to time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Throughput {
    /// MB/s with 1 MB = 1,048,576 bytes
    MegabytesPerSec(f64),
    Unmeasurable,
}

impl Throughput {
    /// Derive throughput from a byte count and elapsed time.
    ///
    /// Anything at or below `MEASUREMENT_EPSILON` is unmeasurable.
    pub fn from_measurement(bytes: u64, elapsed: Duration) -> Self {
        match calculate_throughput_mbps(bytes, elapsed) {
            Some(mbps) => Throughput::MegabytesPerSec(mbps),
            None => Throughput::Unmeasurable,
        }
    }

    pub fn mbps(&self) -> Option<f64> {
        match self {
            Throughput::MegabytesPerSec(mbps) => Some(*mbps),
            Throughput::Unmeasurable => None,
        }
    }

}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Throughput::MegabytesPerSec(mbps) => write!(f, "{:.2} MB/s", mbps),
            Throughput::Unmeasurable => write!(f, "unmeasurable"),
        }
    }
}

/// Measurement of one completed phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Bytes transferred inside the timed window
    pub bytes: u64,
    #[serde(with = "duration_serde")]
    pub elapsed: Duration,
    pub throughput: Throughput,
}

impl PhaseResult {
    pub fn new(phase: Phase, bytes: u64, elapsed: Duration) -> Self {
        Self {
            phase,
            bytes,
            elapsed,
            throughput: Throughput::from_measurement(bytes, elapsed),
        }
    }
}

/// Why the read loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadTermination {
    /// The expected byte count was reached
    SizeReached,
    /// A read returned zero bytes first
    EndOfFile,
}

/// Read phase measurement plus the loop exit condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadOutcome {
    pub result: PhaseResult,
    pub termination: ReadTermination,
}

/// What happened to a phase during an orchestrated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PhaseStatus {
    Completed(PhaseResult),
    Failed {
        error: String,
        /// Operator advice from `error::user_friendly_message`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hint: Option<String>,
    },
    Skipped { reason: String },
}

impl PhaseStatus {
    /// Record a phase error together with its operator hint
    pub fn failed(err: &DiskBenchError) -> Self {
        PhaseStatus::Failed {
            error: err.to_string(),
            hint: Some(error::user_friendly_message(err)),
        }
    }

    pub fn result(&self) -> Option<&PhaseResult> {
        match self {
            PhaseStatus::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PhaseStatus::Failed { .. })
    }
}

/// Outcome of deleting the benchmark file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CleanupStatus {
    Removed,
    /// Nothing was on disk to delete
    AlreadyAbsent,
    Failed { error: String },
}

/// Complete record of one write/read/cleanup run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Timestamp when the run started
    pub timestamp: DateTime<Utc>,
    /// Configuration used for this run
    pub config: BenchmarkConfig,
    /// block_size x block_count, informational only
    pub target_bytes: u64,
    pub write: PhaseStatus,
    pub read: PhaseStatus,
    pub read_termination: Option<ReadTermination>,
    pub cleanup: CleanupStatus,
}

impl RunReport {
    /// Start a report for the given configuration
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            timestamp: Utc::now(),
            target_bytes: config.target_size(),
            config,
            write: PhaseStatus::Skipped {
                reason: "not started".to_string(),
            },
            read: PhaseStatus::Skipped {
                reason: "not started".to_string(),
            },
            read_termination: None,
            cleanup: CleanupStatus::AlreadyAbsent,
        }
    }

    /// True unless a benchmark phase failed. Cleanup never counts.
    pub fn succeeded(&self) -> bool {
        !self.write.is_failed() && !self.read.is_failed()
    }

    /// `"<Phase> failed: <error>"` for each failed phase, followed by its hint
    pub fn failure_messages(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for (phase, status) in [(Phase::Write, &self.write), (Phase::Read, &self.read)] {
            if let PhaseStatus::Failed { error, hint } = status {
                messages.push(format!("{} failed: {}", phase.label(), error));
                if let Some(hint) = hint {
                    messages.push(hint.clone());
                }
            }
        }
        messages
    }

    /// One-line summary used by the history listing
    pub fn summary(&self) -> String {
        let speed = |status: &PhaseStatus| match status {
            PhaseStatus::Completed(result) => result.throughput.to_string(),
            PhaseStatus::Failed { .. } => "failed".to_string(),
            PhaseStatus::Skipped { .. } => "skipped".to_string(),
        };
        format!(
            "{} - {} in {} blocks - write {} - read {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            format_bytes(self.target_bytes),
            self.config.block_count,
            speed(&self.write),
            speed(&self.read),
        )
    }
}

// Durations are stored as integer nanoseconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_nanos() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
