// src/cli/args.rs

use clap::Parser;

/// Structural analysis engine for Go modules: interfaces, satisfiers and
/// call sites, reported as JSON on stdout.
#[derive(Parser)]
#[command(name = "goscope")]
#[command(version)]
#[command(about = "Analyze a Go module's interfaces, implementations and call sites")]
pub struct Cli {
    /// Directory to analyze; append /... to include all packages below it
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,

    /// Verbose diagnostics on stderr (same as RUST_LOG=goscope=info)
    #[arg(short, long)]
    pub verbose: bool,
}
