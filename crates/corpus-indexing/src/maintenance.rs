//! Housekeeping outside the indexing runs.
//!
//! Deleting a course deletes every context inside it. Between
//! [`ContextDeletions::course_deleting_start`] and
//! [`ContextDeletions::course_deleting_finish`] the per-context deletes for
//! those contexts are skipped, and the course is removed from the index
//! with one course-wide delete when it finishes.

use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info};

use corpus_search::SearchBackend;
use corpus_types::{ContextId, ContextInfo};

use crate::error::IndexingError;
use crate::queue::RequestQueue;

/// Courses whose deletion is in progress.
#[derive(Debug, Default)]
pub struct ContextDeletions {
    courses: Mutex<BTreeSet<ContextId>>,
}

impl ContextDeletions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<ContextId>> {
        self.courses.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn course_deleting_start(&self, course_id: ContextId) {
        self.lock().insert(course_id);
        debug!(course = %course_id, "Course deletion started");
    }

    /// Remove the whole course from the index and drop its own requests.
    ///
    /// Returns the number of requests dropped.
    pub fn course_deleting_finish(
        &self,
        backend: &dyn SearchBackend,
        queue: &RequestQueue,
        course_id: ContextId,
    ) -> Result<usize, IndexingError> {
        self.lock().remove(&course_id);
        backend.delete_course(course_id)?;
        backend.commit()?;
        let dropped = queue.remove_for_context(course_id)?;
        info!(course = %course_id, dropped, "Removed deleted course from index");
        Ok(dropped)
    }

    pub fn is_deleting(&self, context: &ContextInfo) -> bool {
        let courses = self.lock();
        context.path.iter().any(|id| courses.contains(id))
    }

    /// Forget a deleted context: its documents leave the index and its
    /// pending requests are dropped. Only documents owned by the context
    /// itself are removed; descendants are reported individually. Inside a
    /// course being deleted only the requests go.
    ///
    /// Returns the number of requests dropped.
    pub fn context_deleted(
        &self,
        backend: &dyn SearchBackend,
        queue: &RequestQueue,
        context: &ContextInfo,
    ) -> Result<usize, IndexingError> {
        if self.is_deleting(context) {
            let dropped = queue.remove_for_context(context.id)?;
            debug!(context = %context.id, dropped, "Context goes with its course");
            return Ok(dropped);
        }

        backend.delete_context(context.id)?;
        backend.commit()?;
        let dropped = queue.remove_for_context(context.id)?;
        info!(context = %context.id, dropped, "Removed deleted context from index");
        Ok(dropped)
    }
}
