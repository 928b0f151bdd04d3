//! Run leases around `index()` and `process()`.
//!
//! A lease is a persisted row naming the current holder and an expiry.
//! Taking it fails fast if another holder owns an unexpired one; the guard
//! releases it on drop.

use std::sync::Arc;

use tracing::{debug, warn};
use ulid::Ulid;

use corpus_storage::Storage;
use corpus_types::Timestamp;

use crate::error::IndexingError;

/// Lease name for full-corpus indexing runs
pub const INDEX_LEASE: &str = "index";

/// Lease name for request processing runs
pub const REQUESTS_LEASE: &str = "requests";

/// Held lease; released when dropped.
#[derive(Debug)]
pub struct LeaseGuard {
    storage: Arc<Storage>,
    name: String,
    holder: String,
}

impl LeaseGuard {
    pub fn acquire(
        storage: &Arc<Storage>,
        name: &str,
        now: Timestamp,
        ttl_secs: i64,
    ) -> Result<Self, IndexingError> {
        let holder = Ulid::new().to_string();
        if !storage.try_acquire_lease(name, &holder, now, ttl_secs)? {
            return Err(IndexingError::AlreadyRunning(name.to_string()));
        }
        debug!(lease = name, holder = %holder, "Acquired run lease");
        Ok(Self {
            storage: storage.clone(),
            name: name.to_string(),
            holder,
        })
    }

    pub fn holder(&self) -> &str {
        &self.holder
    }
}

impl Drop for LeaseGuard {
    fn drop(&mut self) {
        match self.storage.release_lease(&self.name, &self.holder) {
            Ok(true) => debug!(lease = %self.name, "Released run lease"),
            Ok(false) => warn!(lease = %self.name, "Run lease was taken over before release"),
            Err(e) => warn!(lease = %self.name, error = %e, "Failed to release run lease"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_rejected_until_drop() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());

        let guard = LeaseGuard::acquire(&storage, INDEX_LEASE, 1000, 60).unwrap();
        let err = LeaseGuard::acquire(&storage, INDEX_LEASE, 1001, 60).unwrap_err();
        assert!(matches!(err, IndexingError::AlreadyRunning(ref name) if name == "index"));

        // Different lease names do not conflict
        let _requests = LeaseGuard::acquire(&storage, REQUESTS_LEASE, 1001, 60).unwrap();

        drop(guard);
        assert!(LeaseGuard::acquire(&storage, INDEX_LEASE, 1002, 60).is_ok());
    }

    #[test]
    fn test_expired_lease_taken_over() {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());

        let stale = LeaseGuard::acquire(&storage, INDEX_LEASE, 1000, 60).unwrap();
        let fresh = LeaseGuard::acquire(&storage, INDEX_LEASE, 1060, 60).unwrap();
        assert_ne!(stale.holder(), fresh.holder());

        // Dropping the stale guard must not release the new holder's lease
        drop(stale);
        assert_eq!(
            storage.get_lease(INDEX_LEASE).unwrap().unwrap().holder,
            fresh.holder()
        );
    }
}
