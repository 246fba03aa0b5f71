//! Data models module
//!
//! Contains per-phase measurements and the run report.

pub mod result;

// Re-export commonly used types
pub use result::{
    CleanupStatus, Phase, PhaseResult, PhaseStatus, ReadOutcome, ReadTermination, RunReport,
    Throughput,
};
