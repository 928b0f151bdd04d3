//! Error types shared across the corpus indexing system.

use thiserror::Error;

/// Unified error type for domain-level operations.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Malformed search area identifier
    #[error("Trying to parse invalid search area id {0}")]
    InvalidAreaId(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
