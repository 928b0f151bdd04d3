//! RocksDB wrapper for corpus indexing state.
//!
//! Provides:
//! - Database open with column family setup
//! - Area cursor rows (get/put/delete/list)
//! - Request queue rows keyed by (context, area), with per-context lookups
//! - Expiring leases guarding the index and request runs

use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, info};

use corpus_types::{AreaId, AreaState, ContextId, IndexRequest, Timestamp};

use crate::column_families::{
    build_cf_descriptors, ALL_CF_NAMES, CF_AREA_STATE, CF_INDEX_REQUESTS, CF_LEASES,
};
use crate::error::StorageError;
use crate::keys::{AreaStateKey, LeaseKey, RequestKey};
use crate::lease::Lease;

/// Main storage interface
pub struct Storage {
    db: DB,
    /// Next request id
    request_sequence: AtomicU64,
    /// Serializes lease read-modify-write within this process
    lease_lock: Mutex<()>,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;

        let request_sequence = Self::load_request_sequence(&db)?;

        Ok(Self {
            db,
            request_sequence: AtomicU64::new(request_sequence),
            lease_lock: Mutex::new(()),
        })
    }

    /// Highest stored request id plus one
    fn load_request_sequence(db: &DB) -> Result<u64, StorageError> {
        let cf = db
            .cf_handle(CF_INDEX_REQUESTS)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_INDEX_REQUESTS.to_string()))?;

        let mut max_id = 0;
        for item in db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let request = IndexRequest::from_bytes(&value)?;
            max_id = max_id.max(request.id);
        }
        Ok(max_id + 1)
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    fn scan_prefix(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self.cf(cf_name)?;
        let mut results = Vec::new();
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    // ==================== Area State ====================

    pub fn get_area_state(&self, area_id: &AreaId) -> Result<Option<AreaState>, StorageError> {
        let cf = self.cf(CF_AREA_STATE)?;
        let key = AreaStateKey::new(area_id.clone());
        match self.db.get_cf(cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(AreaState::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn put_area_state(&self, area_id: &AreaId, state: &AreaState) -> Result<(), StorageError> {
        let cf = self.cf(CF_AREA_STATE)?;
        let key = AreaStateKey::new(area_id.clone());
        self.db.put_cf(cf, key.to_bytes(), state.to_bytes()?)?;
        debug!(
            area = %area_id,
            last_index_run = state.last_index_run,
            partial = state.partial,
            "Stored area state"
        );
        Ok(())
    }

    /// Returns true if a row existed.
    pub fn delete_area_state(&self, area_id: &AreaId) -> Result<bool, StorageError> {
        let cf = self.cf(CF_AREA_STATE)?;
        let key = AreaStateKey::new(area_id.clone()).to_bytes();
        let existed = self.db.get_cf(cf, &key)?.is_some();
        if existed {
            self.db.delete_cf(cf, &key)?;
        }
        Ok(existed)
    }

    /// All stored area rows in area id order.
    pub fn list_area_states(&self) -> Result<Vec<(AreaId, AreaState)>, StorageError> {
        self.scan_prefix(CF_AREA_STATE, b"area:")?
            .into_iter()
            .map(|(key, value)| -> Result<(AreaId, AreaState), StorageError> {
                let key = AreaStateKey::from_bytes(&key)?;
                Ok((key.area_id, AreaState::from_bytes(&value)?))
            })
            .collect()
    }

    // ==================== Index Requests ====================

    /// Allocate a new monotonic request id.
    pub fn next_request_id(&self) -> u64 {
        self.request_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Insert or overwrite the row for the request's (context, area).
    pub fn put_request(&self, request: &IndexRequest) -> Result<(), StorageError> {
        let cf = self.cf(CF_INDEX_REQUESTS)?;
        let key = RequestKey::new(request.context_id, request.search_area.clone());
        self.db.put_cf(cf, key.to_bytes(), request.to_bytes()?)?;
        Ok(())
    }

    pub fn get_request(
        &self,
        context_id: ContextId,
        search_area: Option<&AreaId>,
    ) -> Result<Option<IndexRequest>, StorageError> {
        let cf = self.cf(CF_INDEX_REQUESTS)?;
        let key = RequestKey::new(context_id, search_area.cloned());
        match self.db.get_cf(cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(IndexRequest::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Every pending row for one context.
    pub fn get_requests_for_context(
        &self,
        context_id: ContextId,
    ) -> Result<Vec<IndexRequest>, StorageError> {
        self.scan_prefix(CF_INDEX_REQUESTS, &RequestKey::context_prefix(context_id))?
            .into_iter()
            .map(|(_, value)| IndexRequest::from_bytes(&value).map_err(StorageError::from))
            .collect()
    }

    /// Every pending row, in key order.
    pub fn list_requests(&self) -> Result<Vec<IndexRequest>, StorageError> {
        self.scan_prefix(CF_INDEX_REQUESTS, &RequestKey::prefix())?
            .into_iter()
            .map(|(_, value)| IndexRequest::from_bytes(&value).map_err(StorageError::from))
            .collect()
    }

    pub fn delete_request(&self, request: &IndexRequest) -> Result<(), StorageError> {
        let cf = self.cf(CF_INDEX_REQUESTS)?;
        let key = RequestKey::new(request.context_id, request.search_area.clone());
        self.db.delete_cf(cf, key.to_bytes())?;
        Ok(())
    }

    /// Delete every row for one context. Returns count deleted.
    pub fn delete_requests_for_context(&self, context_id: ContextId) -> Result<usize, StorageError> {
        let rows = self.scan_prefix(CF_INDEX_REQUESTS, &RequestKey::context_prefix(context_id))?;
        self.delete_keys(CF_INDEX_REQUESTS, rows)
    }

    /// Delete every request row. Returns count deleted.
    pub fn clear_requests(&self) -> Result<usize, StorageError> {
        let rows = self.scan_prefix(CF_INDEX_REQUESTS, &RequestKey::prefix())?;
        self.delete_keys(CF_INDEX_REQUESTS, rows)
    }

    fn delete_keys(
        &self,
        cf_name: &str,
        rows: Vec<(Vec<u8>, Vec<u8>)>,
    ) -> Result<usize, StorageError> {
        let cf = self.cf(cf_name)?;
        let mut batch = WriteBatch::default();
        for (key, _) in &rows {
            batch.delete_cf(cf, key);
        }
        if !rows.is_empty() {
            self.db.write(batch)?;
            debug!(cf = cf_name, count = rows.len(), "Deleted rows");
        }
        Ok(rows.len())
    }

    // ==================== Leases ====================

    pub fn get_lease(&self, name: &str) -> Result<Option<Lease>, StorageError> {
        let cf = self.cf(CF_LEASES)?;
        match self.db.get_cf(cf, LeaseKey::new(name).to_bytes())? {
            Some(bytes) => Ok(Some(Lease::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Take the named lease for `holder` unless another holder owns an
    /// unexpired one. Returns whether the lease is now held by `holder`.
    pub fn try_acquire_lease(
        &self,
        name: &str,
        holder: &str,
        now: Timestamp,
        ttl_secs: i64,
    ) -> Result<bool, StorageError> {
        let _guard = self
            .lease_lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        if let Some(existing) = self.get_lease(name)? {
            if existing.holder != holder && !existing.is_expired(now) {
                debug!(lease = name, holder = %existing.holder, "Lease held elsewhere");
                return Ok(false);
            }
        }

        let lease = Lease {
            name: name.to_string(),
            holder: holder.to_string(),
            acquired_at: now,
            expires_at: now + ttl_secs,
        };
        let cf = self.cf(CF_LEASES)?;
        self.db
            .put_cf(cf, LeaseKey::new(name).to_bytes(), lease.to_bytes()?)?;
        Ok(true)
    }

    /// Release the named lease if `holder` owns it. Returns whether it did.
    pub fn release_lease(&self, name: &str, holder: &str) -> Result<bool, StorageError> {
        let _guard = self
            .lease_lock
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;

        match self.get_lease(name)? {
            Some(existing) if existing.holder == holder => {
                let cf = self.cf(CF_LEASES)?;
                self.db.delete_cf(cf, LeaseKey::new(name).to_bytes())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Flush all column families to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        for cf_name in ALL_CF_NAMES {
            self.db.flush_cf(self.cf(cf_name)?)?;
        }
        Ok(())
    }
}
