//! Typed failures that callers need to tell apart.
//!
//! Everything else flows through `anyhow` with context; these variants exist so
//! the batch loop and the CLI can distinguish a bad model from a failed write.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A strict-mode rejection of model text, located by 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Configuration-class failures surfaced before any artifact is written.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("model file not found: {}", .0.display())]
    ModelNotFound(PathBuf),

    #[error("read model {}: {source}", .path.display())]
    ModelUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("model {} is outside the project root", .0.display())]
    ModelOutsideRoot(PathBuf),

    #[error("parse model {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}
