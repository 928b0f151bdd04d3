//! Persisted queue of targeted reindex requests.
//!
//! Rows are unique per (context, area). A new request is dropped when a
//! pending, not-yet-started row for the same context or an ancestor
//! already covers it at the same or higher priority.

use std::sync::Arc;

use tracing::{debug, info};

use corpus_storage::Storage;
use corpus_types::{AreaId, Clock, ContextId, ContextInfo, IndexRequest, Timestamp};

use crate::error::IndexingError;

/// What [`RequestQueue::request`] did with a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// New row stored
    Inserted { id: u64 },
    /// An existing row already covers it
    Subsumed { by: u64 },
    /// The identical row had its priority raised
    PriorityRaised { id: u64 },
    /// The identical row is in progress at the same or higher priority
    Unchanged { id: u64 },
}

pub struct RequestQueue {
    storage: Arc<Storage>,
    clock: Arc<dyn Clock>,
}

impl RequestQueue {
    pub fn new(storage: Arc<Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Ask for `context` to be reindexed, in one area or all of them.
    pub fn request(
        &self,
        context: &ContextInfo,
        area: Option<&AreaId>,
        priority: i32,
    ) -> Result<RequestOutcome, IndexingError> {
        let scope = std::iter::once(context.id).chain(context.ancestors());

        for context_id in scope {
            for mut row in self.storage.get_requests_for_context(context_id)? {
                let identical = row.context_id == context.id && row.search_area.as_ref() == area;

                if !row.is_started() && row.covers_area(area) {
                    if row.index_priority >= priority {
                        debug!(context = %context.id, by = row.id, "Request already covered");
                        return Ok(RequestOutcome::Subsumed { by: row.id });
                    }
                    if identical {
                        return self.raise_priority(&mut row, priority);
                    }
                } else if identical {
                    if row.index_priority < priority {
                        return self.raise_priority(&mut row, priority);
                    }
                    return Ok(RequestOutcome::Unchanged { id: row.id });
                }
            }
        }

        let request = IndexRequest::new(
            self.storage.next_request_id(),
            context.id,
            area.cloned(),
            self.clock.now(),
            priority,
        );
        self.storage.put_request(&request)?;
        info!(
            id = request.id,
            context = %context.id,
            area = ?area.map(AreaId::as_str),
            priority,
            "Queued index request"
        );
        Ok(RequestOutcome::Inserted { id: request.id })
    }

    fn raise_priority(
        &self,
        row: &mut IndexRequest,
        priority: i32,
    ) -> Result<RequestOutcome, IndexingError> {
        debug!(id = row.id, from = row.index_priority, to = priority, "Raising request priority");
        row.index_priority = priority;
        self.storage.put_request(row)?;
        Ok(RequestOutcome::PriorityRaised { id: row.id })
    }

    /// Every pending row, in processing order.
    pub fn pending(&self) -> Result<Vec<IndexRequest>, IndexingError> {
        let mut rows = self.storage.list_requests()?;
        rows.sort_by(IndexRequest::queue_order);
        Ok(rows)
    }

    /// The row to process next.
    pub fn next(&self) -> Result<Option<IndexRequest>, IndexingError> {
        Ok(self.pending()?.into_iter().next())
    }

    pub fn len(&self) -> Result<usize, IndexingError> {
        Ok(self.storage.list_requests()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, IndexingError> {
        Ok(self.len()? == 0)
    }

    /// Drop every pending row.
    pub fn clear(&self) -> Result<usize, IndexingError> {
        let removed = self.storage.clear_requests()?;
        if removed > 0 {
            info!(removed, "Cleared index request queue");
        }
        Ok(removed)
    }

    /// Drop the rows of one context.
    pub fn remove_for_context(&self, context_id: ContextId) -> Result<usize, IndexingError> {
        Ok(self.storage.delete_requests_for_context(context_id)?)
    }

    pub fn delete(&self, request: &IndexRequest) -> Result<(), IndexingError> {
        self.storage.delete_request(request)?;
        Ok(())
    }

    /// Record how far a cut-off run got.
    pub fn save_progress(
        &self,
        request: &mut IndexRequest,
        partial_area: Option<AreaId>,
        partial_time: Timestamp,
    ) -> Result<(), IndexingError> {
        request.partial_area = partial_area;
        request.partial_time = partial_time;
        self.storage.put_request(request)?;
        Ok(())
    }
}
