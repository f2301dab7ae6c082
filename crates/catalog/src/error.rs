//! Catalog error types.

use std::path::PathBuf;

use policy::PolicyError;
use thiserror::Error;

/// Errors that can occur while loading a policy table.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The policy file could not be read.
    #[error("Failed to read policy file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The policy document is not valid JSON or does not match the schema.
    #[error("Invalid policy document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The table parsed but does not form a valid registry.
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
