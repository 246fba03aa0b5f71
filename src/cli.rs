//! CLI argument parsing for diskbench

use crate::config::{BenchmarkConfig, PayloadKind};
use crate::util::units::parse_bytes;
use crate::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the run report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report lines (default)
    Text,
    /// JSON run report for scripts
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "diskbench")]
#[command(version)]
#[command(about = "Sequential disk write/read throughput benchmark", long_about = None)]
pub struct Cli {
    /// Benchmark file (default: ./disk_benchmark_test_file.dat)
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Bytes per I/O call, e.g. 4096, 64KiB, 1MiB
    #[arg(short = 'b', long, value_name = "SIZE", value_parser = parse_bytes)]
    pub block_size: Option<u64>,

    /// Number of blocks to write
    #[arg(short = 'n', long, value_name = "COUNT")]
    pub block_count: Option<u64>,

    /// Content of the written block
    #[arg(long, value_enum)]
    pub payload: Option<PayloadKind>,

    /// Drop the file from the page cache before the read phase
    #[arg(long)]
    pub drop_cache: bool,

    /// Show a progress bar during each phase
    #[arg(long)]
    pub progress: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Append the run report to the results history
    #[arg(long)]
    pub save: bool,

    /// Print the newest N saved runs and exit
    #[arg(long, value_name = "N")]
    pub history: Option<usize>,

    /// Read defaults from this TOML file instead of the standard location
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Config file values (or defaults) with command-line overrides on top
    pub fn resolve_config(&self) -> Result<BenchmarkConfig> {
        let base = match &self.config {
            Some(path) => BenchmarkConfig::load_from(path)?,
            None => BenchmarkConfig::load()?,
        };
        let config = self.apply(base);
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides to `config`
    pub fn apply(&self, mut config: BenchmarkConfig) -> BenchmarkConfig {
        if let Some(file) = &self.file {
            config.file_path = file.clone();
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        if let Some(block_count) = self.block_count {
            config.block_count = block_count;
        }
        if let Some(payload) = self.payload {
            config.payload = payload;
        }
        config.drop_cache |= self.drop_cache;
        config.progress |= self.progress;
        config
    }
}
