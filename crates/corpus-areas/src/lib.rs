//! # corpus-areas
//!
//! Pluggable content sources for the indexer.
//!
//! - [`SearchArea`]: the capability set every area implements (lazy,
//!   time-ordered record sequence plus a document builder)
//! - [`AreaRegistry`]: the explicitly constructed set of registered areas,
//!   their persisted cursor state and the cached enabled list
//! - [`ContextTree`]: context resolution for targeted indexing
//! - [`MemoryArea`] / [`MemoryContextTree`]: in-memory implementations

pub mod area;
pub mod context_tree;
pub mod error;
pub mod memory;
pub mod registry;

pub use area::{RecordStream, SearchArea};
pub use context_tree::{ContextTree, MemoryContextTree};
pub use error::AreaError;
pub use memory::MemoryArea;
pub use registry::AreaRegistry;
