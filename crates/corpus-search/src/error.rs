//! Backend error types.

use thiserror::Error;

/// Errors raised by a search backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Tantivy index error
    #[error("Tantivy error: {0}")]
    Tantivy(#[from] tantivy::TantivyError),

    /// Query parse error
    #[error("Query parse error: {0}")]
    QueryParse(#[from] tantivy::query::QueryParserError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema mismatch
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Index writer is locked or poisoned
    #[error("Index is locked: {0}")]
    IndexLocked(String),

    /// The backend refused the operation
    #[error("Backend rejected {operation}: {message}")]
    Rejected { operation: String, message: String },
}
