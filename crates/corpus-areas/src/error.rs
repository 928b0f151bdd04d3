//! Error types for search areas and the area registry.

use corpus_storage::StorageError;
use corpus_types::CorpusError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AreaError {
    /// Area id is not registered
    #[error("{0} search area is not available.")]
    AreaNotFound(String),

    /// Area id is registered, so its data must go through the area itself
    #[error("Area {0} exists. Please use appropriate search area class to manipulate the data.")]
    AreaExists(String),

    /// Two areas registered under one id
    #[error("Duplicate search area: {0}")]
    Duplicate(String),

    /// Record query failed
    #[error("Record query failed for {area}: {message}")]
    Query { area: String, message: String },

    /// Document could not be built from a record
    #[error("Document build failed for {area} item {item_id}: {message}")]
    Build {
        area: String,
        item_id: u64,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    InvalidId(#[from] CorpusError),
}
