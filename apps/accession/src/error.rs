//! # Application Errors
//!
//! Failures of the binary: bad configuration, I/O around the server and
//! seed files, and ledger errors tagged with the operation that hit them.

use accession_core::{AccessionError, Operation};
use thiserror::Error;

/// Errors surfaced by CLI commands and server startup.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file or environment could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File or socket I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// A ledger operation failed.
    #[error("{}", public_message(.op, .source))]
    Ledger {
        op: Operation,
        source: AccessionError,
    },

    /// A destructive command was refused.
    #[error("{0}")]
    Refused(String),
}

fn public_message(op: &Operation, source: &AccessionError) -> String {
    source.public_message(*op)
}

impl AppError {
    /// Tag a ledger error with its operation.
    pub fn ledger(op: Operation) -> impl FnOnce(AccessionError) -> Self {
        move |source| Self::Ledger { op, source }
    }
}
