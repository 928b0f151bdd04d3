//! The backend contract consumed by the indexer.

use corpus_types::{AreaId, ContextId, Document};

use crate::error::BackendError;

/// Full-text store receiving documents from the indexer.
///
/// Adds replace any existing document with the same key, so re-sending a
/// document is harmless. Changes become visible on [`commit`](Self::commit).
pub trait SearchBackend: Send + Sync {
    fn add_document(&self, document: &Document) -> Result<(), BackendError>;

    fn delete_document(&self, key: &str) -> Result<(), BackendError>;

    /// Remove every document of an area (full reindex).
    fn delete_area(&self, area_id: &AreaId) -> Result<(), BackendError>;

    /// Remove every document attached to a context.
    fn delete_context(&self, context_id: ContextId) -> Result<(), BackendError>;

    /// Remove every document inside a course, whatever its own context.
    fn delete_course(&self, course_id: ContextId) -> Result<(), BackendError>;

    fn commit(&self) -> Result<(), BackendError>;
}
