//! fsbridge command-line host
//!
//! Drives the bridge one operation per invocation. Logs go to stderr;
//! results go to stdout as raw bytes.

use anyhow::Result;
use clap::Parser;
use fsbridge::cli::{self, Args};
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.output.log_level());

    match execute(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fsbridge: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install the tracing subscriber; `RUST_LOG` overrides the flag-derived level
fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn execute(args: &Args) -> Result<()> {
    let bridge = fsbridge::setup(args.bridge.clone())?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(bridge, &args.command, &mut out)?;
    out.flush()?;
    Ok(())
}
