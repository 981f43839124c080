//! Terminal diagnostics.
//!
//! The compiler aborts on the first error, so a diagnostic is a plain error
//! value propagated with `?` rather than something collected by a handler.
//! It renders as `file:line:col: error: message` when a position is known,
//! or `error: message` otherwise.

use std::fmt;

use crate::span::Span;

/// A single fatal compiler diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Source file the diagnostic refers to, when known.
    pub file: Option<String>,
    /// Source position, when known.
    pub span: Option<Span>,
    /// Human-readable description of the error.
    pub message: String,
}

impl Diagnostic {
    /// A diagnostic with no source position.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            file: None,
            span: None,
            message: message.into(),
        }
    }

    /// A diagnostic anchored at a source position.
    pub fn at(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            span: Some(span),
            message: message.into(),
        }
    }

    /// Attach a file name after the fact (used when a lower phase only knows
    /// the position, not which file it came from).
    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        if self.file.is_none() {
            self.file = Some(file.into());
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, &self.span) {
            (Some(file), Some(span)) => {
                write!(
                    f,
                    "{}:{}:{}: error: {}",
                    file, span.line, span.col, self.message
                )
            },
            _ => write!(f, "error: {}", self.message),
        }
    }
}

impl std::error::Error for Diagnostic {}

/// Result alias used by the front-end phases.
pub type Result<T> = std::result::Result<T, Diagnostic>;
