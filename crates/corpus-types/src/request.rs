//! Targeted reindex requests.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::ids::{AreaId, ContextId};
use crate::Timestamp;

/// Priority of reactive requests triggered by content changes.
pub const INDEX_PRIORITY_NORMAL: i32 = 100;

/// Priority of background maintenance reindexing.
pub const INDEX_PRIORITY_REINDEXING: i32 = 50;

/// A pending request to (re)index a context subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRequest {
    /// Monotonic row id
    pub id: u64,
    pub context_id: ContextId,
    /// `None` means every area
    pub search_area: Option<AreaId>,
    pub time_requested: Timestamp,
    pub index_priority: i32,
    /// Area the previous run stopped in
    #[serde(default)]
    pub partial_area: Option<AreaId>,
    /// Last fully processed timestamp in `partial_area`
    #[serde(default)]
    pub partial_time: Timestamp,
}

impl IndexRequest {
    pub fn new(
        id: u64,
        context_id: ContextId,
        search_area: Option<AreaId>,
        time_requested: Timestamp,
        index_priority: i32,
    ) -> Self {
        Self {
            id,
            context_id,
            search_area,
            time_requested,
            index_priority,
            partial_area: None,
            partial_time: 0,
        }
    }

    /// Whether a previous run already made partial progress on this request.
    pub fn is_started(&self) -> bool {
        self.partial_area.is_some()
    }

    /// Whether this row's area selection includes `area` (`None` = all).
    pub fn covers_area(&self, area: Option<&AreaId>) -> bool {
        match (&self.search_area, area) {
            (None, _) => true,
            (Some(mine), Some(theirs)) => mine == theirs,
            (Some(_), None) => false,
        }
    }

    /// Processing order: priority descending, then oldest first, then id.
    pub fn queue_order(a: &IndexRequest, b: &IndexRequest) -> Ordering {
        b.index_priority
            .cmp(&a.index_priority)
            .then(a.time_requested.cmp(&b.time_requested))
            .then(a.id.cmp(&b.id))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CorpusError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CorpusError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
