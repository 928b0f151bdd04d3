//! # corpus-search
//!
//! The full-text backend the indexer writes to.
//!
//! - [`SearchBackend`]: add/delete/commit contract consumed by the indexer
//! - [`TantivyBackend`]: embedded Tantivy index, documents replaced by key
//! - [`RecordingBackend`]: in-memory backend that records every call, with
//!   optional simulated per-document cost and failure injection. Built for
//!   tests and behind the `test-util` feature elsewhere.

pub mod backend;
pub mod error;
pub mod index;
#[cfg(any(test, feature = "test-util"))]
pub mod recording;
pub mod schema;
pub mod tantivy_backend;

pub use backend::SearchBackend;
pub use error::BackendError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
#[cfg(any(test, feature = "test-util"))]
pub use recording::{Deletion, RecordingBackend};
pub use schema::{build_corpus_schema, CorpusSchema};
pub use tantivy_backend::{SearchHit, TantivyBackend};
