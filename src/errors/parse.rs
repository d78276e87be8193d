// src/errors/parse.rs
//! Parse diagnostics for the Go frontend.
//!
//! Parse errors are collected per file rather than thrown: a file that
//! fails to parse contributes its errors to the owning package, and the
//! loader decides whether the package still carries enough type info to
//! participate in analysis.

use crate::frontend::Span;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ParseErrorKind {
    #[error("expected {expected}, found '{found}'")]
    ExpectedToken { expected: String, found: String },

    #[error("expected expression, found '{found}'")]
    ExpectedExpression { found: String },

    #[error("expected type, found '{found}'")]
    ExpectedType { found: String },

    #[error("expected identifier, found '{found}'")]
    ExpectedIdentifier { found: String },

    #[error("expected 'package' clause at start of file")]
    MissingPackageClause,

    #[error("unterminated {what}")]
    Unterminated { what: &'static str },

    #[error("invalid character {ch:?}")]
    InvalidCharacter { ch: char },
}

/// A parse error anchored to a file position.
#[derive(Error, Debug, Clone)]
#[error("{}:{}: {kind}", .file.display(), .span.line)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub file: PathBuf,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            file: PathBuf::new(),
        }
    }

    /// Attach the owning file once it is known (the parser works on
    /// in-memory source and learns the path from the loader).
    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.file = file;
        self
    }
}
