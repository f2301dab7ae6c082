//! Audit sink error types.

use thiserror::Error;

/// Errors a sink may return while writing a record.
///
/// The dispatcher logs these and moves on; they never reach callers of
/// `authorize`.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink refused the record.
    #[error("Audit sink rejected record: {0}")]
    Rejected(String),

    /// Writing to the underlying destination failed.
    #[error("Audit sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The record could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for audit sink operations.
pub type Result<T> = std::result::Result<T, SinkError>;
