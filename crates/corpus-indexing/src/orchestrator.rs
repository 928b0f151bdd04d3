//! Full-corpus incremental indexing.
//!
//! Runs every enabled area under one shared deadline, persisting each
//! area's cursor as soon as the area is done so an interrupted run loses
//! nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use corpus_areas::AreaRegistry;
use corpus_types::{AreaId, AreaState};

use crate::area_indexer::{deadline, processed_message, time_is_up, AreaIndexOutcome, AreaIndexer};
use crate::error::IndexingError;
use crate::lease::{LeaseGuard, INDEX_LEASE};
use crate::progress::ProgressTrace;
use crate::queue::RequestQueue;

/// Per-area line of an [`IndexRunSummary`].
#[derive(Debug, Clone)]
pub struct AreaRunReport {
    pub area_id: AreaId,
    pub outcome: AreaIndexOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct IndexRunSummary {
    /// Areas visited, in run order
    pub areas: Vec<AreaRunReport>,
    /// Run ended on the deadline before visiting every area
    pub stopped_on_time_limit: bool,
}

impl IndexRunSummary {
    pub fn records(&self) -> u64 {
        self.areas.iter().map(|a| a.outcome.records).sum()
    }

    pub fn documents(&self) -> u64 {
        self.areas.iter().map(|a| a.outcome.documents).sum()
    }

    /// Whether any visited area was left partial.
    pub fn partial(&self) -> bool {
        self.stopped_on_time_limit || self.areas.iter().any(|a| a.outcome.partial)
    }
}

pub struct FullCorpusOrchestrator {
    registry: Arc<AreaRegistry>,
    indexer: Arc<AreaIndexer>,
    queue: Arc<RequestQueue>,
}

impl FullCorpusOrchestrator {
    pub fn new(
        registry: Arc<AreaRegistry>,
        indexer: Arc<AreaIndexer>,
        queue: Arc<RequestQueue>,
    ) -> Self {
        Self {
            registry,
            indexer,
            queue,
        }
    }

    /// Index every enabled area.
    ///
    /// Areas left partial by an earlier run go last; the rest run quickest
    /// first. `full_reindex` drops each area's documents and cursor; once
    /// every area has been rebuilt in full, the requests queued before the
    /// run are dropped as well.
    pub fn index(
        &self,
        full_reindex: bool,
        time_limit: Option<Duration>,
        progress: &dyn ProgressTrace,
    ) -> Result<IndexRunSummary, IndexingError> {
        let clock = self.indexer.clock().clone();
        let _lease = LeaseGuard::acquire(
            self.registry.storage(),
            INDEX_LEASE,
            clock.now(),
            self.indexer.config().lease_ttl_secs,
        )?;

        let stop_at = deadline(clock.as_ref(), time_limit);
        info!(full_reindex, time_limit = ?time_limit, "Starting corpus indexing run");

        // Requests a complete full reindex satisfies; later ones stay queued
        let satisfied = if full_reindex {
            self.queue.pending()?
        } else {
            Vec::new()
        };

        let mut areas = Vec::new();
        for area in self.registry.enabled_areas()? {
            let state = self.registry.state(area.id())?;
            areas.push((area, state));
        }
        areas.sort_by_key(|(_, state)| (state.partial, state.last_indexing_duration().unwrap_or(0)));

        let area_count = areas.len();
        let mut summary = IndexRunSummary::default();
        for (area, previous) in areas {
            progress.output(&format!("Processing area: {}", area.visible_name()), 0);

            let indexing_start = clock.now();
            let outcome = match self.indexer.index_area(
                area.as_ref(),
                &previous,
                full_reindex,
                stop_at,
                progress,
            ) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(area = %area.id(), error = %e, "Area indexing failed, cursor not advanced");
                    return Err(e);
                }
            };

            if outcome.has_records() {
                progress.output(&processed_message(&outcome), 1);
            } else {
                progress.output("No new documents to index.", 1);
            }

            if outcome.has_records() || previous.partial || outcome.partial || full_reindex {
                self.indexer.backend().commit()?;

                let last_index_run = match outcome.last_indexed {
                    Some(last) => last,
                    None if full_reindex => 0,
                    None => previous.last_index_run,
                };
                let state = AreaState {
                    enabled: previous.enabled,
                    indexing_start,
                    indexing_end: clock.now(),
                    last_index_run,
                    partial: outcome.partial,
                    records_processed: outcome.records,
                    documents_processed: outcome.documents,
                    documents_skipped: outcome.skipped,
                };
                self.registry.save_state(area.id(), &state)?;
                info!(
                    area = %area.id(),
                    last_index_run,
                    partial = outcome.partial,
                    records = outcome.records,
                    "Saved area cursor"
                );
            }

            summary.areas.push(AreaRunReport {
                area_id: area.id().clone(),
                outcome,
            });

            if time_is_up(clock.as_ref(), stop_at) {
                progress.output("Stopping indexing due to time limit.", 0);
                summary.stopped_on_time_limit = true;
                break;
            }
        }

        let finished_every_area = summary.areas.len() == area_count
            && !summary.areas.iter().any(|a| a.outcome.partial);
        if full_reindex {
            if finished_every_area {
                for request in &satisfied {
                    self.queue.delete(request)?;
                }
                info!(removed = satisfied.len(), "Full reindex satisfied queued requests");
            } else {
                info!(
                    pending = satisfied.len(),
                    "Full reindex cut off, keeping queued requests"
                );
            }
        }

        info!(
            records = summary.records(),
            documents = summary.documents(),
            partial = summary.partial(),
            "Corpus indexing run finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_areas::{MemoryArea, MemoryContextTree, SearchArea};
    use corpus_search::RecordingBackend;
    use corpus_storage::Storage;
    use corpus_types::{ContextId, ContextLevel, ManualClock, INDEX_PRIORITY_NORMAL};
    use tempfile::TempDir;

    use crate::config::IndexingConfig;
    use crate::progress::{BufferedProgress, NoOpProgress};

    const NOW: i64 = 1_700_000_000;

    struct Fixture {
        clock: Arc<ManualClock>,
        backend: Arc<RecordingBackend>,
        registry: Arc<AreaRegistry>,
        queue: Arc<RequestQueue>,
        orchestrator: FullCorpusOrchestrator,
        pages: Arc<MemoryArea>,
        posts: Arc<MemoryArea>,
        _temp: TempDir,
    }

    fn fixture(add_cost_ms: i64) -> Fixture {
        let temp = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(temp.path()).unwrap());
        let clock = Arc::new(ManualClock::at(NOW));
        let tree = Arc::new(MemoryContextTree::new());
        let pages = Arc::new(
            MemoryArea::new("mod_page", "activity", "Pages", tree.clone()).unwrap(),
        );
        let posts = Arc::new(MemoryArea::new("mod_forum", "post", "Forum posts", tree).unwrap());
        let registry = Arc::new(
            AreaRegistry::new(storage.clone())
                .with_area(pages.clone())
                .unwrap()
                .with_area(posts.clone())
                .unwrap(),
        );
        let backend = Arc::new(RecordingBackend::new().with_add_cost(clock.clone(), add_cost_ms));
        let indexer = Arc::new(AreaIndexer::new(
            backend.clone(),
            clock.clone(),
            IndexingConfig::default(),
        ));
        let queue = Arc::new(RequestQueue::new(storage, clock.clone()));
        let orchestrator =
            FullCorpusOrchestrator::new(registry.clone(), indexer, queue.clone());
        Fixture {
            clock,
            backend,
            registry,
            queue,
            orchestrator,
            pages,
            posts,
            _temp: temp,
        }
    }

    #[test]
    fn test_frog_toad_zombie_werewolf() {
        let f = fixture(1_200);
        f.registry.set_enabled(f.posts.id(), false).unwrap();
        let t = NOW - 100;
        f.pages.put_item(1, ContextId(5), t, "Frog");
        f.pages.put_item(2, ContextId(5), t + 1, "Toad");
        f.pages.put_item(3, ContextId(5), t + 2, "Zombie");
        f.pages.put_item(4, ContextId(5), t + 2, "Werewolf");

        let summary = f
            .orchestrator
            .index(false, Some(Duration::from_secs(2)), &NoOpProgress)
            .unwrap();
        assert!(summary.partial());
        assert_eq!(f.backend.added_titles(), vec!["Frog", "Toad"]);
        let state = f.registry.state(f.pages.id()).unwrap();
        assert!(state.partial);
        assert_eq!(state.last_index_run, t + 1);

        // Toad is sent again: the cut fell after its second
        f.backend.clear_log();
        f.orchestrator.index(false, None, &NoOpProgress).unwrap();
        let added = f.backend.added_titles();
        assert_eq!(added[0], "Toad");
        let mut rest = added[1..].to_vec();
        rest.sort();
        assert_eq!(rest, vec!["Werewolf", "Zombie"]);
        let state = f.registry.state(f.pages.id()).unwrap();
        assert!(!state.partial);
        assert_eq!(state.last_index_run, t + 2);
    }

    #[test]
    fn test_second_run_is_idempotent() {
        let f = fixture(0);
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");
        f.posts.put_item(1, ContextId(5), NOW - 50, "Toad");

        f.orchestrator.index(false, None, &NoOpProgress).unwrap();
        let before = f.registry.storage().list_area_states().unwrap();
        let commits = f.backend.commits();

        f.clock.advance_secs(600);
        let progress = BufferedProgress::new();
        let summary = f.orchestrator.index(false, None, &progress).unwrap();

        assert_eq!(summary.records(), 0);
        assert_eq!(f.registry.storage().list_area_states().unwrap(), before);
        assert_eq!(f.backend.commits(), commits);
        assert_eq!(
            progress.get_buffer(),
            "Processing area: Forum posts\n  No new documents to index.\n\
             Processing area: Pages\n  No new documents to index.\n"
        );
    }

    #[test]
    fn test_progress_output_and_state() {
        let f = fixture(0);
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");

        let progress = BufferedProgress::new();
        f.orchestrator.index(false, None, &progress).unwrap();
        assert_eq!(
            progress.get_buffer(),
            "Processing area: Forum posts\n  No new documents to index.\n\
             Processing area: Pages\n  Processed 1 records containing 1 documents, in 0.0 seconds.\n"
        );

        let state = f.registry.state(f.pages.id()).unwrap();
        assert_eq!(state.last_index_run, NOW - 100);
        assert_eq!(state.indexing_start, NOW);
        assert_eq!(state.records_processed, 1);
        assert!(!state.partial);
        // Never touched
        assert!(!f.registry.state(f.posts.id()).unwrap().has_run());
    }

    #[test]
    fn test_partial_and_slow_areas_run_last() {
        let f = fixture(0);
        f.registry
            .save_state(
                f.posts.id(),
                &AreaState {
                    indexing_start: NOW - 1_000,
                    indexing_end: NOW - 900,
                    last_index_run: NOW - 2_000,
                    ..AreaState::new(true)
                },
            )
            .unwrap();
        f.registry
            .save_state(
                f.pages.id(),
                &AreaState {
                    indexing_start: NOW - 1_000,
                    indexing_end: NOW - 990,
                    last_index_run: NOW - 2_000,
                    ..AreaState::new(true)
                },
            )
            .unwrap();

        let summary = f.orchestrator.index(false, None, &NoOpProgress).unwrap();
        let order: Vec<_> = summary.areas.iter().map(|a| a.area_id.to_string()).collect();
        assert_eq!(order, vec!["mod_page-activity", "mod_forum-post"]);

        let mut state = f.registry.state(f.pages.id()).unwrap();
        state.partial = true;
        f.registry.save_state(f.pages.id(), &state).unwrap();
        let summary = f.orchestrator.index(false, None, &NoOpProgress).unwrap();
        let order: Vec<_> = summary.areas.iter().map(|a| a.area_id.to_string()).collect();
        assert_eq!(order, vec!["mod_forum-post", "mod_page-activity"]);
        // Partial flag cleared once the area finishes
        assert!(!f.registry.state(f.pages.id()).unwrap().partial);
    }

    #[test]
    fn test_stops_between_areas_on_time_limit() {
        let f = fixture(1_000);
        f.posts.put_item(1, ContextId(5), NOW - 100, "Zombie");
        f.posts.put_item(2, ContextId(5), NOW - 90, "Werewolf");
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");

        let progress = BufferedProgress::new();
        let summary = f
            .orchestrator
            .index(false, Some(Duration::from_secs(2)), &progress)
            .unwrap();

        assert!(summary.stopped_on_time_limit);
        assert_eq!(summary.areas.len(), 1);
        assert_eq!(f.backend.added_titles(), vec!["Zombie", "Werewolf"]);
        assert!(progress.get_buffer().ends_with("Stopping indexing due to time limit.\n"));
        assert!(!f.registry.state(f.pages.id()).unwrap().has_run());
    }

    #[test]
    fn test_full_reindex() {
        let f = fixture(0);
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");
        f.orchestrator.index(false, None, &NoOpProgress).unwrap();

        let course = corpus_types::ContextInfo::root(ContextId(10), ContextLevel::Course, "TCourse");
        f.queue.request(&course, None, INDEX_PRIORITY_NORMAL).unwrap();

        f.backend.clear_log();
        f.orchestrator.index(true, None, &NoOpProgress).unwrap();

        assert_eq!(f.backend.added_titles(), vec!["Frog"]);
        assert_eq!(f.backend.deleted_areas().len(), 2);
        assert!(f.queue.is_empty().unwrap());
        // Empty area still gets a fresh run recorded
        let posts = f.registry.state(f.posts.id()).unwrap();
        assert_eq!(posts.last_index_run, 0);
        assert!(posts.has_run());
    }

    #[test]
    fn test_cut_off_full_reindex_keeps_requests() {
        let f = fixture(1_000);
        for i in 1..=4u64 {
            f.posts.put_item(i, ContextId(5), NOW - 100 + i as i64, &format!("Post {}", i));
        }
        f.pages.put_item(1, ContextId(23), NOW - 100, "Frog");
        let page = corpus_types::ContextInfo::root(ContextId(23), ContextLevel::Module, "TPage");
        f.queue.request(&page, None, INDEX_PRIORITY_NORMAL).unwrap();

        let summary = f
            .orchestrator
            .index(true, Some(Duration::from_secs(1)), &NoOpProgress)
            .unwrap();
        assert!(summary.stopped_on_time_limit);
        assert_eq!(summary.areas.len(), 1);
        assert_eq!(f.backend.added_titles(), vec!["Post 1", "Post 2"]);
        // The page area was never rebuilt, so its request must survive
        assert_eq!(f.queue.len().unwrap(), 1);

        f.orchestrator.index(true, None, &NoOpProgress).unwrap();
        assert!(f.queue.is_empty().unwrap());
    }

    #[test]
    fn test_requests_queued_during_full_reindex_survive() {
        let f = fixture(0);
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");
        let page = corpus_types::ContextInfo::root(ContextId(23), ContextLevel::Module, "TPage");
        f.queue.request(&page, None, INDEX_PRIORITY_NORMAL).unwrap();

        let progress = QueueingProgress {
            queue: f.queue.clone(),
        };
        f.orchestrator.index(true, None, &progress).unwrap();

        let pending = f.queue.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].context_id, ContextId(42));
    }

    /// Queues a request for context 42 as soon as the run reports progress.
    struct QueueingProgress {
        queue: Arc<RequestQueue>,
    }

    impl ProgressTrace for QueueingProgress {
        fn output(&self, _message: &str, _depth: usize) {
            let late = corpus_types::ContextInfo::root(ContextId(42), ContextLevel::Module, "Late");
            let _ = self.queue.request(&late, None, INDEX_PRIORITY_NORMAL);
        }
    }

    #[test]
    fn test_backend_failure_keeps_cursor() {
        let f = fixture(0);
        f.pages.put_item(1, ContextId(5), NOW - 100, "Frog");
        f.pages.put_item(2, ContextId(5), NOW - 90, "Toad");
        f.backend.fail_after(1);

        assert!(f.orchestrator.index(false, None, &NoOpProgress).is_err());
        assert!(!f.registry.state(f.pages.id()).unwrap().has_run());

        f.backend.stop_failing();
        f.backend.clear_log();
        f.orchestrator.index(false, None, &NoOpProgress).unwrap();
        assert_eq!(f.backend.added_titles(), vec!["Frog", "Toad"]);
    }

    #[test]
    fn test_concurrent_run_rejected() {
        let f = fixture(0);
        let _held = LeaseGuard::acquire(f.registry.storage(), INDEX_LEASE, NOW, 60).unwrap();
        let err = f.orchestrator.index(false, None, &NoOpProgress).unwrap_err();
        assert!(matches!(err, IndexingError::AlreadyRunning(_)));
    }
}
