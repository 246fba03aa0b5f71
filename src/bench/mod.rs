//! Benchmark engine module
//!
//! Contains the timed write and read phases and the orchestrator that
//! chains them into one run.

pub mod orchestrator;
pub mod sequential;

// Re-export commonly used types
pub use orchestrator::{speed_line, Orchestrator};
pub use sequential::{run_read_benchmark, run_write_benchmark, SequentialBenchmark};
