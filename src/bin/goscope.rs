// src/bin/goscope.rs

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use goscope::cli::Cli;
use goscope::commands::run_analysis;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "goscope=info" } else { "goscope=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    run_analysis(&cli.path, cli.pretty)
}
