//! Reindexing of one context subtree.
//!
//! Unlike the corpus-wide run this ignores area cursors and the indexing
//! delay: every record inside the context is sent again. A run cut off by
//! its time budget reports where to resume; resuming starts at that
//! timestamp again, so its records are sent a second time.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use corpus_areas::AreaRegistry;
use corpus_types::{AreaId, ContextInfo, Timestamp};

use crate::area_indexer::{deadline, processed_message, AreaIndexer};
use crate::error::IndexingError;
use crate::progress::ProgressTrace;

/// Completion token of [`ContextIndexer::index_context`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextIndexResult {
    pub complete: bool,
    /// Area the run stopped in
    pub start_from_area: Option<AreaId>,
    /// Last timestamp handled in `start_from_area`
    pub start_from_time: Timestamp,
    pub records: u64,
    pub documents: u64,
}

impl ContextIndexResult {
    fn complete(records: u64, documents: u64) -> Self {
        Self {
            complete: true,
            start_from_area: None,
            start_from_time: 0,
            records,
            documents,
        }
    }
}

pub struct ContextIndexer {
    registry: Arc<AreaRegistry>,
    indexer: Arc<AreaIndexer>,
}

impl ContextIndexer {
    pub fn new(registry: Arc<AreaRegistry>, indexer: Arc<AreaIndexer>) -> Self {
        Self { registry, indexer }
    }

    pub fn registry(&self) -> &Arc<AreaRegistry> {
        &self.registry
    }

    pub fn area_indexer(&self) -> &Arc<AreaIndexer> {
        &self.indexer
    }

    /// Index everything inside `context`, optionally in one area only.
    ///
    /// Pass the `start_from_*` values of an incomplete result back as
    /// `resume_from_area` / `resume_from_time` to carry on where it stopped.
    pub fn index_context(
        &self,
        context: &ContextInfo,
        area_filter: Option<&AreaId>,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
        resume_from_area: Option<&AreaId>,
        resume_from_time: Timestamp,
    ) -> Result<ContextIndexResult, IndexingError> {
        let stop_at = deadline(self.indexer.clock().as_ref(), time_limit);
        self.index_context_until(
            context,
            area_filter,
            stop_at,
            progress,
            resume_from_area,
            resume_from_time,
            0,
        )
    }

    /// As [`index_context`](Self::index_context) with an absolute deadline,
    /// writing progress from `depth`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn index_context_until(
        &self,
        context: &ContextInfo,
        area_filter: Option<&AreaId>,
        stop_at: Option<i64>,
        progress: &dyn ProgressTrace,
        resume_from_area: Option<&AreaId>,
        resume_from_time: Timestamp,
        depth: usize,
    ) -> Result<ContextIndexResult, IndexingError> {
        let clock = self.indexer.clock().clone();
        let mut areas = self.registry.enabled_areas()?;
        if let Some(filter) = area_filter {
            areas.retain(|area| area.id() == filter);
            if areas.is_empty() {
                debug!(area = %filter, "Requested area is not enabled, nothing to index");
            }
        }

        let mut records = 0;
        let mut documents = 0;

        for area in areas {
            let since = match resume_from_area {
                Some(resume) if area.id() < resume => continue,
                Some(resume) if area.id() == resume => resume_from_time,
                _ => 0,
            };

            progress.output(&format!("Processing area: {}", area.visible_name()), depth);

            let start_ms = clock.now_millis();
            let Some(stream) =
                self.indexer
                    .open_recordset(area.as_ref(), since, Some(context), depth + 1, progress)?
            else {
                progress.output("Skipping (not relevant to context).", depth + 1);
                continue;
            };

            let outcome = self.indexer.process_records(
                area.as_ref(),
                stream,
                None,
                stop_at,
                start_ms,
                depth + 1,
                progress,
            )?;
            records += outcome.records;
            documents += outcome.documents;

            if outcome.has_records() {
                progress.output(&processed_message(&outcome), depth + 1);
                self.indexer.backend().commit()?;
            } else {
                progress.output("No documents to index.", depth + 1);
            }

            if outcome.partial {
                progress.output("Stopping indexing due to time limit.", depth);
                let start_from_time = outcome.last_indexed.unwrap_or(since);
                info!(
                    context = %context.id,
                    area = %area.id(),
                    start_from_time,
                    "Context indexing cut off"
                );
                return Ok(ContextIndexResult {
                    complete: false,
                    start_from_area: Some(area.id().clone()),
                    start_from_time,
                    records,
                    documents,
                });
            }
        }

        debug!(context = %context.id, records, documents, "Context indexing complete");
        Ok(ContextIndexResult::complete(records, documents))
    }
}
