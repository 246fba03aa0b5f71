use clap::Parser;
use diskbench::bench::Orchestrator;
use diskbench::cli::{Cli, OutputFormat};
use diskbench::config::persistence::ResultsStorage;
use diskbench::{error, DiskBenchError, Result};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; diagnostics go to stderr, the report to stdout
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();
}

fn print_history(count: usize) -> Result<()> {
    let storage = ResultsStorage::new()?;
    let results = storage.recent_results(count)?;
    if results.is_empty() {
        println!("No saved runs in {}", storage.path().display());
        return Ok(());
    }
    for report in results.iter().rev() {
        println!("{}", report.summary());
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<bool> {
    if let Some(count) = cli.history {
        print_history(count)?;
        return Ok(true);
    }

    let config = cli.resolve_config()?;
    let orchestrator = Orchestrator::new(config)?;

    let report = match cli.format {
        OutputFormat::Text => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            orchestrator.run(&mut lock)
        }
        OutputFormat::Json => {
            let report = orchestrator.run(&mut io::sink());
            let json = serde_json::to_string_pretty(&report)?;
            writeln!(io::stdout(), "{}", json)?;
            report
        }
    };

    for message in report.failure_messages() {
        eprintln!("{}", message);
    }

    if cli.save {
        // Losing the history entry does not invalidate the measurement
        if let Err(e) = ResultsStorage::new().and_then(|storage| storage.append_result(report.clone())) {
            eprintln!("Warning: {}", error::user_friendly_message(&e));
        }
    }

    Ok(report.succeeded())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e @ DiskBenchError::ConfigError(_)) => {
            eprintln!("{}", error::user_friendly_message(&e));
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", error::user_friendly_message(&e));
            ExitCode::from(1)
        }
    }
}
