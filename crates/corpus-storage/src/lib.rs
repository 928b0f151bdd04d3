//! Storage layer for the corpus indexing system.
//!
//! Provides RocksDB-backed storage with:
//! - Column family isolation for area cursors, queued requests and leases
//! - Context-prefixed request keys so covering rows are found by prefix scan
//! - Monotonic request ids recovered on open
//! - Expiring run leases for cross-process mutual exclusion

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod lease;

pub use db::Storage;
pub use error::StorageError;
pub use keys::{AreaStateKey, LeaseKey, RequestKey};
pub use lease::Lease;
