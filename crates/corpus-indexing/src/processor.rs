//! Drains the request queue under a time budget.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use corpus_areas::ContextTree;
use corpus_types::IndexRequest;

use crate::area_indexer::{deadline, time_is_up};
use crate::context_indexer::ContextIndexer;
use crate::error::IndexingError;
use crate::lease::{LeaseGuard, REQUESTS_LEASE};
use crate::progress::ProgressTrace;
use crate::queue::RequestQueue;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessSummary {
    /// Requests finished and removed
    pub completed: usize,
    /// Requests dropped because their context is gone
    pub skipped_deleted: usize,
    /// A request was cut off and saved for later
    pub interrupted: bool,
}

pub struct RequestProcessor {
    queue: Arc<RequestQueue>,
    contexts: Arc<ContextIndexer>,
    tree: Arc<dyn ContextTree>,
}

impl RequestProcessor {
    pub fn new(
        queue: Arc<RequestQueue>,
        contexts: Arc<ContextIndexer>,
        tree: Arc<dyn ContextTree>,
    ) -> Self {
        Self {
            queue,
            contexts,
            tree,
        }
    }

    /// Work through pending requests in queue order until the queue is
    /// empty or `time_limit` runs out. `None` or zero means no limit.
    pub fn process(
        &self,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
    ) -> Result<ProcessSummary, IndexingError> {
        let indexer = self.contexts.area_indexer();
        let clock = indexer.clock().clone();
        let _lease = LeaseGuard::acquire(
            self.contexts.registry().storage(),
            REQUESTS_LEASE,
            clock.now(),
            indexer.config().lease_ttl_secs,
        )?;

        let stop_at = deadline(clock.as_ref(), time_limit);
        let mut summary = ProcessSummary::default();

        loop {
            if time_is_up(clock.as_ref(), stop_at) {
                break;
            }
            let Some(mut request) = self.queue.next()? else {
                break;
            };

            let Some(context) = self.tree.context(request.context_id) else {
                progress.output(&format!("Skipped deleted context: {}", request.context_id), 0);
                self.queue.delete(&request)?;
                summary.skipped_deleted += 1;
                continue;
            };

            let label = request_label(&context.display_name(), &request);
            progress.output(&format!("Indexing requested context: {}", label), 0);

            let start_ms = clock.now_millis();
            let result = match self.contexts.index_context_until(
                &context,
                request.search_area.as_ref(),
                stop_at,
                progress,
                request.partial_area.as_ref(),
                request.partial_time,
                1,
            ) {
                Ok(result) => result,
                Err(e) => {
                    warn!(id = request.id, error = %e, "Request failed, left in queue");
                    return Err(e);
                }
            };
            let took = clock.elapsed_secs(start_ms);

            if result.complete {
                self.queue.delete(&request)?;
                summary.completed += 1;
                progress.output(
                    &format!("Completed requested context: {} ({:.1}s)", label, took),
                    0,
                );
            } else {
                self.queue.save_progress(
                    &mut request,
                    result.start_from_area,
                    result.start_from_time,
                )?;
                summary.interrupted = true;
                progress.output(
                    &format!("Ending requested context: {} ({:.1}s)", label, took),
                    0,
                );
                break;
            }
        }

        info!(
            completed = summary.completed,
            skipped_deleted = summary.skipped_deleted,
            interrupted = summary.interrupted,
            "Request processing finished"
        );
        Ok(summary)
    }
}

fn request_label(name: &str, request: &IndexRequest) -> String {
    match &request.search_area {
        Some(area) => format!("{} (search area: {})", name, area),
        None => name.to_string(),
    }
}
