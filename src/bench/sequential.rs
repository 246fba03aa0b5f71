//! Sequential benchmark operations
//!
//! The write phase pushes one reused data block `block_count` times and
//! flushes to the device inside the timed window. The read phase pulls the
//! file back in chunks of at most `block_size` until the expected size or
//! end of file.

use crate::config::PayloadKind;
use crate::io::buffer::DataBlock;
use crate::io::disk::{DiskIO, PlatformDiskIO};
use crate::models::{Phase, PhaseResult, ReadOutcome, ReadTermination};
use crate::{DiskBenchError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Sequential benchmark executor
pub struct SequentialBenchmark<D: DiskIO = PlatformDiskIO> {
    disk_io: D,
    show_progress: bool,
}

impl SequentialBenchmark<PlatformDiskIO> {
    /// Create an executor on the real filesystem
    pub fn new() -> Self {
        Self::with_disk_io(PlatformDiskIO::new())
    }
}

impl Default for SequentialBenchmark<PlatformDiskIO> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: DiskIO> SequentialBenchmark<D> {
    /// Create an executor over a custom disk I/O backend
    pub fn with_disk_io(disk_io: D) -> Self {
        Self {
            disk_io,
            show_progress: false,
        }
    }

    /// Draw an `indicatif` bar while a phase runs
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn disk_io(&self) -> &D {
        &self.disk_io
    }

    /// Run the write phase with a freshly generated block
    pub fn run_write(
        &self,
        path: &Path,
        block_size: u64,
        block_count: u64,
        payload: PayloadKind,
    ) -> Result<PhaseResult> {
        let block_size = block_len(block_size)?;
        let mut file = self
            .disk_io
            .open_write(path)
            .map_err(|source| DiskBenchError::OpenError {
                path: path.to_path_buf(),
                source,
            })?;

        // Generated outside the timed window and reused for every call
        let block = DataBlock::generate(block_size, payload)?;
        let progress = self.progress_bar((block_size as u64).saturating_mul(block_count));
        let mut total_written = 0u64;

        debug!(
            path = %path.display(),
            block_size,
            block_count,
            payload = block.kind().description(),
            "starting write phase"
        );

        let start_time = Instant::now();
        for index in 0..block_count {
            let written = file.write_direct(&block).map_err(|e| {
                warn!(block = index, bytes = total_written, error = %e, "write call failed");
                DiskBenchError::Io(e)
            })?;
            total_written += written as u64;

            if written != block_size {
                warn!(block = index, written, block_size, "short write, aborting");
                progress.abandon();
                return Err(DiskBenchError::PartialWrite {
                    requested: block_size,
                    transferred: written,
                    total_written,
                });
            }

            progress.inc(written as u64);
        }

        file.sync_all().map_err(|e| {
            warn!(bytes = total_written, error = %e, "sync failed");
            DiskBenchError::Io(e)
        })?;
        let elapsed = start_time.elapsed();
        drop(file);
        progress.finish_and_clear();

        debug!(bytes = total_written, ?elapsed, "write phase completed");
        Ok(PhaseResult::new(Phase::Write, total_written, elapsed))
    }

    /// Run the read phase against an existing file
    pub fn run_read(
        &self,
        path: &Path,
        block_size: u64,
        expected_total: u64,
    ) -> Result<ReadOutcome> {
        let block_size = block_len(block_size)?;
        let mut file = self
            .disk_io
            .open_read(path)
            .map_err(|source| DiskBenchError::OpenError {
                path: path.to_path_buf(),
                source,
            })?;

        let mut buffer = vec![0u8; block_size];
        let progress = self.progress_bar(expected_total);
        let mut total_read = 0u64;

        debug!(path = %path.display(), block_size, expected_total, "starting read phase");

        let start_time = Instant::now();
        let termination = loop {
            if total_read >= expected_total {
                break ReadTermination::SizeReached;
            }

            let remaining = expected_total - total_read;
            let read_size = remaining.min(block_size as u64) as usize;
            let read_bytes = file.read_direct(&mut buffer[..read_size]).map_err(|e| {
                warn!(bytes = total_read, error = %e, "read call failed");
                DiskBenchError::Io(e)
            })?;

            if read_bytes == 0 {
                break ReadTermination::EndOfFile;
            }

            total_read += read_bytes as u64;
            progress.inc(read_bytes as u64);
        };
        let elapsed = start_time.elapsed();
        drop(file);
        progress.finish_and_clear();

        if termination == ReadTermination::EndOfFile {
            debug!(bytes = total_read, expected_total, "end of file before expected size");
        }
        debug!(bytes = total_read, ?elapsed, "read phase completed");

        Ok(ReadOutcome {
            result: PhaseResult::new(Phase::Read, total_read, elapsed),
            termination,
        })
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template("{spinner} {bytes}/{total_bytes} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }
}

fn block_len(block_size: u64) -> Result<usize> {
    if block_size == 0 {
        return Err(DiskBenchError::ConfigError(
            "Block size must be greater than 0".to_string(),
        ));
    }
    usize::try_from(block_size).map_err(|_| {
        DiskBenchError::ConfigError(format!("Block size does not fit in memory: {}", block_size))
    })
}

/// Write `block_count` random blocks of `block_size` bytes to `path`
pub fn run_write_benchmark(path: &Path, block_size: u64, block_count: u64) -> Result<PhaseResult> {
    SequentialBenchmark::new().run_write(path, block_size, block_count, PayloadKind::Random)
}

/// Read `path` back in `block_size` chunks, stopping at `expected_total` or EOF
pub fn run_read_benchmark(path: &Path, block_size: u64, expected_total: u64) -> Result<ReadOutcome> {
    SequentialBenchmark::new().run_read(path, block_size, expected_total)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::disk::DirectFile;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;
    use tempfile::tempdir;

    /// Disk backend that can cut one write call short and counts syncs
    #[derive(Default)]
    pub(crate) struct MockDiskIO {
        /// Zero-based write call that comes back short
        pub short_write_at: Option<u64>,
        /// Bytes accepted by the short call
        pub short_write_len: usize,
        pub fail_open: bool,
        pub fail_remove: bool,
        pub writes: Rc<Cell<u64>>,
        pub reads: Rc<Cell<u64>>,
        pub syncs: Rc<Cell<u32>>,
    }

    struct MockFile {
        short_write_at: Option<u64>,
        short_write_len: usize,
        writes: Rc<Cell<u64>>,
        reads: Rc<Cell<u64>>,
        syncs: Rc<Cell<u32>>,
    }

    impl DirectFile for MockFile {
        fn write_direct(&mut self, buf: &[u8]) -> io::Result<usize> {
            let call = self.writes.get();
            self.writes.set(call + 1);
            if self.short_write_at == Some(call) {
                Ok(self.short_write_len.min(buf.len()))
            } else {
                Ok(buf.len())
            }
        }

        fn read_direct(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            self.reads.set(self.reads.get() + 1);
            Ok(0)
        }

        fn sync_all(&mut self) -> io::Result<()> {
            self.syncs.set(self.syncs.get() + 1);
            Ok(())
        }
    }

    impl DiskIO for MockDiskIO {
        fn open_write(&self, _path: &Path) -> io::Result<Box<dyn DirectFile>> {
            if self.fail_open {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            Ok(Box::new(MockFile {
                short_write_at: self.short_write_at,
                short_write_len: self.short_write_len,
                writes: Rc::clone(&self.writes),
                reads: Rc::clone(&self.reads),
                syncs: Rc::clone(&self.syncs),
            }))
        }

        fn open_read(&self, path: &Path) -> io::Result<Box<dyn DirectFile>> {
            self.open_write(path)
        }

        fn evict_cache(&self, _path: &Path) -> io::Result<bool> {
            Ok(false)
        }

        fn remove(&self, _path: &Path) -> io::Result<()> {
            if self.fail_remove {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "busy"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_write_returns_total_bytes() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");

        let result = run_write_benchmark(&path, 64 * 1024, 16).unwrap();

        assert_eq!(result.phase, Phase::Write);
        assert_eq!(result.bytes, 1024 * 1024);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 1024 * 1024);
    }

    #[test]
    fn test_write_reuses_same_block() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");

        run_write_benchmark(&path, 4096, 3).unwrap();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents.len(), 3 * 4096);
        assert_eq!(contents[..4096], contents[4096..8192]);
        assert_eq!(contents[..4096], contents[8192..]);
    }

    #[test]
    fn test_write_pattern_payload() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");

        SequentialBenchmark::new()
            .run_write(&path, 512, 2, PayloadKind::Pattern)
            .unwrap();

        let contents = std::fs::read(&path).unwrap();
        assert_eq!(contents[255], 255);
        assert_eq!(contents[256], 0);
        assert_eq!(contents[512], 0);
    }

    #[test]
    fn test_short_write_aborts_without_sync() {
        let disk_io = MockDiskIO {
            short_write_at: Some(3),
            short_write_len: 100,
            ..Default::default()
        };
        let writes = Rc::clone(&disk_io.writes);
        let syncs = Rc::clone(&disk_io.syncs);
        let bench = SequentialBenchmark::with_disk_io(disk_io);

        let err = bench
            .run_write(Path::new("mock.dat"), 1024, 10, PayloadKind::Pattern)
            .unwrap_err();

        match err {
            DiskBenchError::PartialWrite {
                requested,
                transferred,
                total_written,
            } => {
                assert_eq!(requested, 1024);
                assert_eq!(transferred, 100);
                assert_eq!(total_written, 3 * 1024 + 100);
            }
            other => panic!("expected partial write, got {:?}", other),
        }
        assert_eq!(writes.get(), 4);
        assert_eq!(syncs.get(), 0);
    }

    #[test]
    fn test_zero_blocks_still_syncs() {
        let disk_io = MockDiskIO::default();
        let writes = Rc::clone(&disk_io.writes);
        let syncs = Rc::clone(&disk_io.syncs);
        let bench = SequentialBenchmark::with_disk_io(disk_io);

        let result = bench
            .run_write(Path::new("mock.dat"), 1024, 0, PayloadKind::Random)
            .unwrap();

        assert_eq!(result.bytes, 0);
        assert_eq!(writes.get(), 0);
        assert_eq!(syncs.get(), 1);
    }

    #[test]
    fn test_write_open_error() {
        let bench = SequentialBenchmark::with_disk_io(MockDiskIO {
            fail_open: true,
            ..Default::default()
        });

        let err = bench
            .run_write(Path::new("mock.dat"), 1024, 1, PayloadKind::Random)
            .unwrap_err();
        assert!(matches!(err, DiskBenchError::OpenError { .. }));
    }

    #[test]
    fn test_write_missing_parent_directory() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("no_such_dir").join("bench.dat");

        match run_write_benchmark(&path, 1024, 1) {
            Err(DiskBenchError::OpenError { path: failed, source }) => {
                assert_eq!(failed, path);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected open error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");

        assert!(matches!(
            run_write_benchmark(&path, 0, 1),
            Err(DiskBenchError::ConfigError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_read_stops_at_expected_size() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        std::fs::write(&path, vec![5u8; 10_000]).unwrap();

        let outcome = run_read_benchmark(&path, 4096, 6000).unwrap();

        assert_eq!(outcome.result.phase, Phase::Read);
        assert_eq!(outcome.result.bytes, 6000);
        assert_eq!(outcome.termination, ReadTermination::SizeReached);
    }

    #[test]
    fn test_read_short_file_ends_at_eof() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        std::fs::write(&path, vec![5u8; 5000]).unwrap();

        let outcome = run_read_benchmark(&path, 4096, 8192).unwrap();

        assert_eq!(outcome.result.bytes, 5000);
        assert_eq!(outcome.termination, ReadTermination::EndOfFile);
    }

    #[test]
    fn test_read_zero_expected_bytes() {
        let disk_io = MockDiskIO::default();
        let reads = Rc::clone(&disk_io.reads);

        let outcome = SequentialBenchmark::with_disk_io(disk_io)
            .run_read(Path::new("mock.dat"), 4096, 0)
            .unwrap();

        assert_eq!(outcome.result.bytes, 0);
        assert_eq!(outcome.termination, ReadTermination::SizeReached);
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_read_missing_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("missing.dat");

        assert!(matches!(
            run_read_benchmark(&path, 4096, 4096),
            Err(DiskBenchError::OpenError { .. })
        ));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bench.dat");
        let bench = SequentialBenchmark::new();

        let written = bench
            .run_write(&path, 1_048_576, 10, PayloadKind::Random)
            .unwrap();
        assert_eq!(written.bytes, 10_485_760);

        let outcome = bench.run_read(&path, 1_048_576, written.bytes).unwrap();
        assert_eq!(outcome.result.bytes, 10_485_760);
        assert_eq!(outcome.termination, ReadTermination::SizeReached);
    }
}
