// src/errors/mod.rs
//! Error taxonomy for the analysis pipeline.
//!
//! Two kinds are fatal and abort the orchestrator: a load that produces no
//! usable packages, and a call analysis that produces no program or no
//! position table. Everything else is a warning emitted through `tracing`
//! and degrades the report instead of aborting.

pub mod parse;

pub use parse::ParseError;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors from package loading.
#[derive(Error, Debug, Diagnostic)]
pub enum LoadError {
    #[error("directory not found: {}", .path.display())]
    #[diagnostic(code(goscope::load::missing_dir))]
    DirectoryNotFound { path: PathBuf },

    #[error("no module manifest (go.mod) found at or above {}", .path.display())]
    #[diagnostic(
        code(goscope::load::missing_manifest),
        help("run goscope against a directory inside a Go module")
    )]
    ManifestNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    #[diagnostic(code(goscope::load::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid Go packages could be loaded from {}", .path.display())]
    #[diagnostic(code(goscope::load::no_packages))]
    NoPackages { path: PathBuf },
}

/// Fatal errors from the analysis phases.
#[derive(Error, Debug, Diagnostic)]
pub enum AnalysisError {
    #[error("failed to load packages: {0}")]
    #[diagnostic(transparent)]
    Loader(#[from] LoadError),

    #[error("call analysis produced no program (check package load errors)")]
    #[diagnostic(code(goscope::calls::no_program))]
    NoProgram,

    #[error("call analysis produced no position table")]
    #[diagnostic(code(goscope::calls::no_positions))]
    NoPositionTable,
}
