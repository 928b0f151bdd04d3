//! # corpus-types
//!
//! Shared domain types for the corpus indexing system.
//!
//! This crate defines the core data structures used throughout the system:
//! - Area and context identifiers, and the context hierarchy model
//! - Records (what an area yields) and documents (what the backend receives)
//! - Area cursor state and index requests (the two persisted tables)
//! - The injectable clock used for time budgets
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use corpus_types::{AreaId, INDEX_PRIORITY_NORMAL};
//!
//! let area = AreaId::parse("mod_forum-post").unwrap();
//! assert_eq!(area.component(), "mod_forum");
//! assert!(INDEX_PRIORITY_NORMAL > corpus_types::INDEX_PRIORITY_REINDEXING);
//! ```

pub mod area_state;
pub mod clock;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod ids;
pub mod request;

pub use area_state::AreaState;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{IndexingSettings, Settings};
pub use context::{ContextInfo, ContextLevel};
pub use document::{AreaRecord, Document};
pub use error::CorpusError;
pub use ids::{AreaId, ContextId};
pub use request::{IndexRequest, INDEX_PRIORITY_NORMAL, INDEX_PRIORITY_REINDEXING};

/// Whole seconds since the Unix epoch.
///
/// Record modification times, cursors and request times all use this
/// granularity; ties are resolved per second.
pub type Timestamp = i64;
