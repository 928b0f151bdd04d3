//! Column family definitions for RocksDB.
//!
//! - area_state: one cursor row per search area
//! - index_requests: pending targeted reindex requests
//! - leases: run leases for the index and request jobs

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for per-area indexing state
pub const CF_AREA_STATE: &str = "area_state";

/// Column family name for the reindex request queue
pub const CF_INDEX_REQUESTS: &str = "index_requests";

/// Column family name for run leases
pub const CF_LEASES: &str = "leases";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[CF_AREA_STATE, CF_INDEX_REQUESTS, CF_LEASES];

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    ALL_CF_NAMES
        .iter()
        .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
        .collect()
}
