//! Write, read back, clean up.
//!
//! The orchestrator runs the two phases against one file, hands the write
//! phase's byte count to the read phase, and always tries to delete the file
//! afterwards. Report lines go to the supplied writer as each step finishes.

use crate::bench::sequential::SequentialBenchmark;
use crate::config::BenchmarkConfig;
use crate::io::disk::{DiskIO, PlatformDiskIO};
use crate::models::{CleanupStatus, PhaseResult, PhaseStatus, ReadOutcome, RunReport, Throughput};
use crate::util::units::{bytes_to_megabytes, format_bytes, format_duration};
use crate::{DiskBenchError, Result};
use std::io::{self, Write};
use tracing::{debug, info, warn};

const SEPARATOR_WIDTH: usize = 30;

/// Runs the full write/read/cleanup sequence
pub struct Orchestrator<D: DiskIO = PlatformDiskIO> {
    config: BenchmarkConfig,
    bench: SequentialBenchmark<D>,
}

impl Orchestrator<PlatformDiskIO> {
    /// Create an orchestrator on the real filesystem
    pub fn new(config: BenchmarkConfig) -> Result<Self> {
        Self::with_disk_io(config, PlatformDiskIO::new())
    }
}

impl<D: DiskIO> Orchestrator<D> {
    /// Create an orchestrator over a custom disk I/O backend
    pub fn with_disk_io(config: BenchmarkConfig, disk_io: D) -> Result<Self> {
        config.validate()?;
        let bench = SequentialBenchmark::with_disk_io(disk_io).with_progress(config.progress);
        Ok(Self { config, bench })
    }

    /// Run both phases and cleanup, writing report lines to `out`.
    ///
    /// Always returns a report; phase failures are recorded in it.
    pub fn run(&self, out: &mut dyn Write) -> RunReport {
        let mut report = RunReport::new(self.config.clone());

        emit(
            out,
            &format!(
                "Starting disk benchmark with a {:.1} MB file...",
                bytes_to_megabytes(report.target_bytes)
            ),
        );
        emit(out, &"-".repeat(SEPARATOR_WIDTH));

        debug!(state = "writing", path = %self.config.file_path.display());
        let written = match self.write_phase(out) {
            Ok(result) => {
                let bytes = result.bytes;
                report.write = PhaseStatus::Completed(result);
                Some(bytes)
            }
            Err(err) => {
                report.write = PhaseStatus::failed(&err);
                None
            }
        };

        match written {
            Some(bytes) if bytes > 0 => {
                self.prepare_read();
                debug!(state = "reading", expected = bytes);
                match self.read_phase(out, bytes) {
                    Ok(outcome) => {
                        report.read_termination = Some(outcome.termination);
                        report.read = PhaseStatus::Completed(outcome.result);
                    }
                    Err(err) => {
                        report.read = PhaseStatus::failed(&err);
                    }
                }
            }
            Some(_) => {
                emit(out, "No data was written; skipping read test.");
                report.read = PhaseStatus::Skipped {
                    reason: "write phase produced no data".to_string(),
                };
            }
            None => {
                report.read = PhaseStatus::Skipped {
                    reason: "write phase failed".to_string(),
                };
            }
        }

        emit(out, &"-".repeat(SEPARATOR_WIDTH));

        debug!(state = "cleanup");
        report.cleanup = match self.cleanup() {
            Ok(true) => {
                emit(
                    out,
                    &format!(
                        "Successfully cleaned up the test file: {}",
                        self.config.file_path.display()
                    ),
                );
                CleanupStatus::Removed
            }
            Ok(false) => {
                emit(
                    out,
                    &format!(
                        "No test file to clean up at: {}",
                        self.config.file_path.display()
                    ),
                );
                CleanupStatus::AlreadyAbsent
            }
            Err(err) => {
                let detail = match &err {
                    DiskBenchError::CleanupError { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                emit(out, &format!("Error during file cleanup: {}", detail));
                CleanupStatus::Failed {
                    error: err.to_string(),
                }
            }
        };

        info!(succeeded = report.succeeded(), "benchmark run finished");
        report
    }

    fn write_phase(&self, out: &mut dyn Write) -> Result<PhaseResult> {
        let result = self.bench.run_write(
            &self.config.file_path,
            self.config.block_size,
            self.config.block_count,
            self.config.payload,
        );

        match &result {
            Ok(result) => emit(out, &speed_line(result)),
            Err(DiskBenchError::OpenError { source, .. }) => {
                emit(out, &format!("Error opening file for writing: {}", source))
            }
            Err(err) => emit(out, &format!("Error during write operation: {}", err)),
        }
        result
    }

    fn read_phase(&self, out: &mut dyn Write, expected_total: u64) -> Result<ReadOutcome> {
        let outcome = self
            .bench
            .run_read(&self.config.file_path, self.config.block_size, expected_total);

        match &outcome {
            Ok(outcome) => emit(out, &speed_line(&outcome.result)),
            Err(DiskBenchError::OpenError { source, .. }) => {
                emit(out, &format!("Error opening file for reading: {}", source))
            }
            Err(err) => emit(out, &format!("Error during read operation: {}", err)),
        }
        outcome
    }

    // Untimed; failure only means the read may be served from RAM.
    fn prepare_read(&self) {
        if !self.config.drop_cache {
            return;
        }

        match self.bench.disk_io().evict_cache(&self.config.file_path) {
            Ok(true) => debug!("page cache dropped before read"),
            Ok(false) => warn!("page cache eviction is not supported on this platform"),
            Err(e) => warn!(error = %e, "page cache eviction failed"),
        }
    }

    /// Delete the benchmark file.
    ///
    /// `Ok(false)` means there was nothing to delete.
    pub fn cleanup(&self) -> Result<bool> {
        let path = &self.config.file_path;
        match self.bench.disk_io().remove(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => {
                warn!(path = %path.display(), error = %source, "cleanup failed");
                Err(DiskBenchError::CleanupError {
                    path: path.clone(),
                    source,
                })
            }
        }
    }
}

/// `Disk Write Speed: 123.45 MB/s (4.00 MiB in 32ms)` or the too-quick message
pub fn speed_line(result: &PhaseResult) -> String {
    match result.throughput {
        Throughput::MegabytesPerSec(mbps) => format!(
            "Disk {} Speed: {:.2} MB/s ({} in {})",
            result.phase.label(),
            mbps,
            format_bytes(result.bytes),
            format_duration(result.elapsed)
        ),
        Throughput::Unmeasurable => format!(
            "{} test completed too quickly to measure speed.",
            result.phase.label()
        ),
    }
}

fn emit(out: &mut dyn Write, line: &str) {
    if let Err(e) = writeln!(out, "{}", line) {
        warn!(error = %e, "failed to write report line");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::sequential::tests::MockDiskIO;
    use crate::config::PayloadKind;
    use crate::models::{Phase, ReadTermination};
    use std::time::Duration;
    use tempfile::tempdir;

    fn run_to_string<D: DiskIO>(orchestrator: &Orchestrator<D>) -> (RunReport, String) {
        let mut out = Vec::new();
        let report = orchestrator.run(&mut out);
        (report, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_full_run_reads_back_and_cleans_up() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        let config = BenchmarkConfig::new()
            .with_file_path(&path)
            .with_block_size(1_048_576)
            .with_block_count(10);

        let orchestrator = Orchestrator::new(config).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        assert!(report.succeeded());
        assert_eq!(report.target_bytes, 10_485_760);
        assert_eq!(report.write.result().unwrap().bytes, 10_485_760);
        assert_eq!(report.read.result().unwrap().bytes, 10_485_760);
        assert_eq!(report.read_termination, Some(ReadTermination::SizeReached));
        assert_eq!(report.cleanup, CleanupStatus::Removed);
        assert!(!path.exists());

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "Starting disk benchmark with a 10.0 MB file...");
        assert_eq!(lines[1], "-".repeat(30));
        let write = report.write.result().unwrap();
        let read = report.read.result().unwrap();
        assert_eq!(lines[2], speed_line(write));
        assert_eq!(lines[3], speed_line(read));
        if write.throughput != Throughput::Unmeasurable {
            assert!(lines[2].ends_with(&format!(
                "({} in {})",
                format_bytes(10_485_760),
                format_duration(write.elapsed)
            )));
        }
        assert_eq!(lines[4], "-".repeat(30));
        assert!(lines[5].starts_with("Successfully cleaned up the test file:"));
    }

    #[test]
    fn test_write_open_failure_skips_read() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing_dir").join("bench.dat");
        let config = BenchmarkConfig::new()
            .with_file_path(&path)
            .with_block_size(4096)
            .with_block_count(4);

        let orchestrator = Orchestrator::new(config).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        assert!(!report.succeeded());
        assert!(report.write.is_failed());
        assert!(matches!(report.read, PhaseStatus::Skipped { .. }));
        assert_eq!(report.cleanup, CleanupStatus::AlreadyAbsent);
        assert!(output.contains("Error opening file for writing:"));
        assert!(!output.contains("Disk Read Speed"));
    }

    #[test]
    fn test_write_open_failure_carries_hint() {
        let disk_io = MockDiskIO {
            fail_open: true,
            ..Default::default()
        };
        let config = BenchmarkConfig::new()
            .with_file_path("mock.dat")
            .with_block_size(1024)
            .with_block_count(4);

        let orchestrator = Orchestrator::with_disk_io(config, disk_io).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        assert!(output.contains("Error opening file for writing: denied"));
        match &report.write {
            PhaseStatus::Failed { hint, .. } => assert_eq!(
                hint.as_deref(),
                Some("Permission denied. Choose a writable location with --file.")
            ),
            other => panic!("expected failed write, got {:?}", other),
        }

        let messages = report.failure_messages();
        assert!(messages[0].starts_with("Write failed: cannot open mock.dat"));
        assert!(messages[1].starts_with("Permission denied"));
    }

    #[test]
    fn test_zero_blocks_skips_read() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        let config = BenchmarkConfig::new()
            .with_file_path(&path)
            .with_block_size(4096)
            .with_block_count(0);

        let orchestrator = Orchestrator::new(config).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        assert!(report.succeeded());
        assert_eq!(report.write.result().unwrap().bytes, 0);
        assert!(matches!(report.read, PhaseStatus::Skipped { .. }));
        assert_eq!(report.cleanup, CleanupStatus::Removed);
        assert!(output.contains("skipping read test"));
        assert!(!path.exists());
    }

    #[test]
    fn test_partial_write_skips_read_and_still_cleans_up() {
        let disk_io = MockDiskIO {
            short_write_at: Some(1),
            short_write_len: 10,
            ..Default::default()
        };
        let syncs = std::rc::Rc::clone(&disk_io.syncs);
        let config = BenchmarkConfig::new()
            .with_file_path("mock.dat")
            .with_block_size(1024)
            .with_block_count(5)
            .with_payload(PayloadKind::Pattern);

        let orchestrator = Orchestrator::with_disk_io(config, disk_io).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        assert!(report.write.is_failed());
        assert!(matches!(report.read, PhaseStatus::Skipped { .. }));
        assert_eq!(report.cleanup, CleanupStatus::Removed);
        assert_eq!(syncs.get(), 0);
        assert!(output.contains("Error during write operation: short write of 10 of 1024 bytes"));
    }

    #[test]
    fn test_cleanup_failure_is_not_fatal() {
        let disk_io = MockDiskIO {
            fail_remove: true,
            ..Default::default()
        };
        let config = BenchmarkConfig::new()
            .with_file_path("mock.dat")
            .with_block_size(1024)
            .with_block_count(2);

        let orchestrator = Orchestrator::with_disk_io(config, disk_io).unwrap();
        let (report, output) = run_to_string(&orchestrator);

        // The mock file reads back empty, so the read ends at EOF
        assert_eq!(report.read_termination, Some(ReadTermination::EndOfFile));
        assert!(matches!(report.cleanup, CleanupStatus::Failed { .. }));
        assert!(report.succeeded());
        assert!(output.contains("Error during file cleanup: busy"));
    }

    #[test]
    fn test_drop_cache_run() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        let config = BenchmarkConfig::new()
            .with_file_path(&path)
            .with_block_size(64 * 1024)
            .with_block_count(8)
            .with_drop_cache(true);

        let orchestrator = Orchestrator::new(config).unwrap();
        let (report, _) = run_to_string(&orchestrator);

        assert_eq!(report.read.result().unwrap().bytes, 512 * 1024);
        assert!(!path.exists());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BenchmarkConfig::new().with_block_size(0);
        assert!(matches!(
            Orchestrator::new(config),
            Err(DiskBenchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_speed_line() {
        let measured = PhaseResult::new(Phase::Write, 3 * 1_048_576, Duration::from_secs(2));
        assert_eq!(
            speed_line(&measured),
            format!("Disk Write Speed: 1.50 MB/s ({} in 2s)", format_bytes(3 * 1_048_576))
        );

        let quick = PhaseResult::new(Phase::Read, 4 * 1_048_576, Duration::from_micros(3833));
        assert!(speed_line(&quick).ends_with(" in 3ms 833us)"));

        let instant = PhaseResult::new(Phase::Read, 1_048_576, Duration::ZERO);
        assert_eq!(
            speed_line(&instant),
            "Read test completed too quickly to measure speed."
        );
    }
}
