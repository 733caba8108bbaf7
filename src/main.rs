//! skillz - Agent Skills over MCP
//!
//! Discovers skills under a root directory and serves them, their resources,
//! and their scripts to agents.

use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

use skillz::Result;
use skillz::app::AppContext;
use skillz::cli::Cli;
use skillz::cli::output::emit_error;

/// File name used by `--log`, placed in the temp directory.
const LOG_FILE_NAME: &str = "skillz.log";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            emit_error(cli.output, &e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    skillz::cli::commands::run(&ctx, &cli.command())
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn,skillz=info",
            1 => "info,skillz=debug",
            2 => "debug,skillz=trace",
            _ => "trace",
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // The console honours -v/-q/RUST_LOG; the --log file always records debug.
    if cli.output.is_json() {
        // JSON logging for machine consumers
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_filter(env_filter),
            )
            .with(file_layer(cli.log))
            .init();
    } else {
        // Human-readable logging
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_filter(env_filter))
            .with(file_layer(cli.log))
            .init();
    }
}

fn file_layer<S>(enabled: bool) -> Option<impl Layer<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    enabled.then(open_log_file).flatten().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .with_filter(LevelFilter::DEBUG)
    })
}

fn open_log_file() -> Option<File> {
    let path = std::env::temp_dir().join(LOG_FILE_NAME);
    match File::options().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("Warning: cannot open log file {}: {err}", path.display());
            None
        }
    }
}
