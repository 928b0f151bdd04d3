//! Single entry point wiring the indexing components together.
//!
//! Scheduler jobs and embedders hold one `IndexingService`; every part
//! shares the same registry, backend, clock and request queue.

use std::sync::Arc;
use std::time::Duration;

use corpus_areas::{AreaRegistry, ContextTree};
use corpus_search::SearchBackend;
use corpus_types::{AreaId, Clock, ContextId, ContextInfo, Timestamp};

use crate::area_indexer::AreaIndexer;
use crate::config::IndexingConfig;
use crate::context_indexer::{ContextIndexResult, ContextIndexer};
use crate::error::IndexingError;
use crate::maintenance::ContextDeletions;
use crate::orchestrator::{FullCorpusOrchestrator, IndexRunSummary};
use crate::processor::{ProcessSummary, RequestProcessor};
use crate::progress::ProgressTrace;
use crate::queue::{RequestOutcome, RequestQueue};

pub struct IndexingService {
    registry: Arc<AreaRegistry>,
    indexer: Arc<AreaIndexer>,
    queue: Arc<RequestQueue>,
    contexts: Arc<ContextIndexer>,
    orchestrator: FullCorpusOrchestrator,
    processor: RequestProcessor,
    deletions: ContextDeletions,
}

impl IndexingService {
    pub fn new(
        registry: Arc<AreaRegistry>,
        backend: Arc<dyn SearchBackend>,
        tree: Arc<dyn ContextTree>,
        clock: Arc<dyn Clock>,
        config: IndexingConfig,
    ) -> Self {
        let indexer = Arc::new(AreaIndexer::new(backend, clock.clone(), config));
        let queue = Arc::new(RequestQueue::new(registry.storage().clone(), clock));
        let contexts = Arc::new(ContextIndexer::new(registry.clone(), indexer.clone()));
        let orchestrator =
            FullCorpusOrchestrator::new(registry.clone(), indexer.clone(), queue.clone());
        let processor = RequestProcessor::new(queue.clone(), contexts.clone(), tree);

        Self {
            registry,
            indexer,
            queue,
            contexts,
            orchestrator,
            processor,
            deletions: ContextDeletions::new(),
        }
    }

    pub fn registry(&self) -> &Arc<AreaRegistry> {
        &self.registry
    }

    pub fn queue(&self) -> &Arc<RequestQueue> {
        &self.queue
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        self.indexer.backend()
    }

    /// See [`FullCorpusOrchestrator::index`].
    pub fn index(
        &self,
        full_reindex: bool,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
    ) -> Result<IndexRunSummary, IndexingError> {
        self.orchestrator.index(full_reindex, time_limit, progress)
    }

    pub fn request_index(
        &self,
        context: &ContextInfo,
        area: Option<&AreaId>,
        priority: i32,
    ) -> Result<RequestOutcome, IndexingError> {
        self.queue.request(context, area, priority)
    }

    /// See [`ContextIndexer::index_context`].
    pub fn index_context(
        &self,
        context: &ContextInfo,
        area_filter: Option<&AreaId>,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
        resume_from_area: Option<&AreaId>,
        resume_from_time: Timestamp,
    ) -> Result<ContextIndexResult, IndexingError> {
        self.contexts.index_context(
            context,
            area_filter,
            time_limit,
            progress,
            resume_from_area,
            resume_from_time,
        )
    }

    /// See [`RequestProcessor::process`].
    pub fn process_requests(
        &self,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
    ) -> Result<ProcessSummary, IndexingError> {
        self.processor.process(time_limit, progress)
    }

    /// See [`ContextDeletions::context_deleted`].
    pub fn context_deleted(&self, context: &ContextInfo) -> Result<usize, IndexingError> {
        self.deletions
            .context_deleted(self.backend().as_ref(), &self.queue, context)
    }

    /// Call before the contexts of a course are deleted.
    pub fn course_deleting_start(&self, course_id: ContextId) {
        self.deletions.course_deleting_start(course_id);
    }

    /// Call once the course and everything in it is gone.
    pub fn course_deleting_finish(&self, course_id: ContextId) -> Result<usize, IndexingError> {
        self.deletions
            .course_deleting_finish(self.backend().as_ref(), &self.queue, course_id)
    }

    /// Zero the cursor of one area, or of all of them.
    pub fn reset_area(&self, area: Option<&AreaId>) -> Result<(), IndexingError> {
        Ok(self.registry.reset(area)?)
    }

    pub fn set_area_enabled(&self, area: &AreaId, enabled: bool) -> Result<(), IndexingError> {
        Ok(self.registry.set_enabled(area, enabled)?)
    }

    pub fn clean_up_non_existing_area(&self, area: &AreaId) -> Result<bool, IndexingError> {
        Ok(self.registry.clean_up_non_existing_area(area)?)
    }
}
