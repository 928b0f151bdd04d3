//! Error types for the indexing core.

use corpus_areas::AreaError;
use corpus_search::BackendError;
use corpus_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while indexing or processing requests.
///
/// Running out of time is not an error; it is reported through the
/// `partial` / `complete` fields of the results.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Area lookup, record query or document build failed
    #[error("Area error: {0}")]
    Area(#[from] AreaError),

    /// Search backend rejected an operation
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Another process holds the run lease
    #[error("Indexing run already in progress: {0}")]
    AlreadyRunning(String),
}
