//! Incremental indexing of a single search area.
//!
//! Pulls the area's ascending record sequence from the cursor onwards,
//! builds documents and hands them to the backend until the sequence runs
//! out, a record is too recent to index yet, or the time budget is spent.
//!
//! The budget is only checked between records, and never inside a run of
//! records sharing one `modified` timestamp. A run cut off by the budget is
//! resumed from the cursor's own second, so a record written into that
//! second after the cut is still picked up; the re-sent documents replace
//! themselves by key. A run that finished resumes strictly after the cursor.

use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use tracing::{debug, info};

use corpus_areas::{RecordStream, SearchArea};
use corpus_search::SearchBackend;
use corpus_types::{AreaState, Clock, ContextInfo, Timestamp};

use crate::config::IndexingConfig;
use crate::error::IndexingError;
use crate::progress::ProgressTrace;

const CLOCK_FORMAT: &str = "%H:%M:%S";
const DATE_FORMAT: &str = "%-d/%-m/%y, %H:%M";

/// Result of indexing one area (or one area within a context).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AreaIndexOutcome {
    /// Records pulled from the sequence and handled
    pub records: u64,
    /// Documents sent to the backend
    pub documents: u64,
    /// Records that produced no document
    pub skipped: u64,
    /// `modified` of the last handled record
    pub last_indexed: Option<Timestamp>,
    /// Stopped on the time budget with records left
    pub partial: bool,
    /// Seconds spent, record query included
    pub elapsed_secs: f64,
}

impl AreaIndexOutcome {
    pub fn has_records(&self) -> bool {
        self.records > 0
    }
}

pub struct AreaIndexer {
    backend: Arc<dyn SearchBackend>,
    clock: Arc<dyn Clock>,
    config: IndexingConfig,
}

impl AreaIndexer {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        clock: Arc<dyn Clock>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            config,
        }
    }

    pub fn backend(&self) -> &Arc<dyn SearchBackend> {
        &self.backend
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    /// Index one area from its cursor.
    ///
    /// `stop_at` is a deadline in epoch milliseconds; `None` runs to the end
    /// of the eligible records. Progress lines are written at depth 1. The
    /// caller persists the resulting state.
    pub fn index_area(
        &self,
        area: &dyn SearchArea,
        state: &AreaState,
        full_reindex: bool,
        stop_at: Option<i64>,
        progress: &dyn ProgressTrace,
    ) -> Result<AreaIndexOutcome, IndexingError> {
        let start_ms = self.clock.now_millis();
        let cutoff = self.clock.now() - self.config.indexing_delay_secs;

        let since = resume_point(state, full_reindex);

        if full_reindex {
            self.backend.delete_area(area.id())?;
            info!(area = %area.id(), "Cleared area documents for full reindex");
        }

        debug!(area = %area.id(), since, cutoff, "Indexing area");

        let Some(records) = self.open_recordset(area, since, None, 1, progress)? else {
            return Ok(AreaIndexOutcome {
                elapsed_secs: self.clock.elapsed_secs(start_ms),
                ..Default::default()
            });
        };

        self.process_records(area, records, Some(cutoff), stop_at, start_ms, 1, progress)
    }

    /// Open a record sequence, reporting slow queries.
    pub(crate) fn open_recordset<'a>(
        &self,
        area: &'a dyn SearchArea,
        since: Timestamp,
        restriction: Option<&ContextInfo>,
        depth: usize,
        progress: &dyn ProgressTrace,
    ) -> Result<Option<RecordStream<'a>>, IndexingError> {
        let query_start = self.clock.now_millis();
        let records = area.document_recordset(since, restriction)?;

        let took = self.clock.elapsed_secs(query_start);
        if took > self.config.long_query_secs {
            progress.output(&format!("Initial query took {:.1} seconds.", took), depth);
        }
        Ok(records)
    }

    /// Drive a record sequence into the backend.
    ///
    /// Records newer than `cutoff` end the run; they are left for a later
    /// one. With a `stop_at` deadline the run stops before a record once the
    /// deadline has passed, provided at least two distinct timestamps have
    /// been handled and the record does not share the last one.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn process_records(
        &self,
        area: &dyn SearchArea,
        records: RecordStream<'_>,
        cutoff: Option<Timestamp>,
        stop_at: Option<i64>,
        start_ms: i64,
        depth: usize,
        progress: &dyn ProgressTrace,
    ) -> Result<AreaIndexOutcome, IndexingError> {
        let mut outcome = AreaIndexOutcome::default();
        let mut first_indexed: Option<Timestamp> = None;
        let interval_ms = self.config.progress_interval_secs.saturating_mul(1000);
        let mut last_progress = self.clock.now_millis();

        for record in records {
            let record = record?;

            if cutoff.is_some_and(|cutoff| record.modified > cutoff) {
                debug!(
                    area = %area.id(),
                    modified = record.modified,
                    "Record inside indexing delay, leaving for next run"
                );
                break;
            }

            if let (Some(stop_at), Some(first), Some(last)) =
                (stop_at, first_indexed, outcome.last_indexed)
            {
                if self.clock.now_millis() >= stop_at
                    && first != last
                    && record.modified != last
                {
                    outcome.partial = true;
                    break;
                }
            }

            match area.build_document(&record)? {
                Some(document) => {
                    self.backend.add_document(&document)?;
                    outcome.documents += 1;
                }
                None => outcome.skipped += 1,
            }
            outcome.records += 1;
            first_indexed.get_or_insert(record.modified);
            outcome.last_indexed = Some(record.modified);

            let now_ms = self.clock.now_millis();
            if interval_ms > 0 && now_ms - last_progress >= interval_ms {
                progress.output(
                    &format!(
                        "{}: Done to {}",
                        format_time(now_ms.div_euclid(1000), CLOCK_FORMAT),
                        format_time(record.modified, DATE_FORMAT)
                    ),
                    depth,
                );
                last_progress = now_ms;
            }
        }

        outcome.elapsed_secs = self.clock.elapsed_secs(start_ms);
        debug!(
            area = %area.id(),
            records = outcome.records,
            documents = outcome.documents,
            partial = outcome.partial,
            "Area pass finished"
        );
        Ok(outcome)
    }
}

/// First `modified` timestamp the next incremental pass asks for.
pub fn resume_point(state: &AreaState, full_reindex: bool) -> Timestamp {
    if full_reindex || state.last_index_run <= 0 {
        0
    } else if state.partial {
        state.last_index_run
    } else {
        state.last_index_run + 1
    }
}

/// Deadline in epoch milliseconds for a run starting now. `None` or a zero
/// limit means unlimited.
pub fn deadline(clock: &dyn Clock, time_limit: Option<Duration>) -> Option<i64> {
    time_limit
        .filter(|limit| !limit.is_zero())
        .map(|limit| clock.now_millis().saturating_add(limit.as_millis() as i64))
}

pub fn time_is_up(clock: &dyn Clock, stop_at: Option<i64>) -> bool {
    stop_at.is_some_and(|stop_at| clock.now_millis() >= stop_at)
}

/// Operator summary line for a pass that handled records.
pub fn processed_message(outcome: &AreaIndexOutcome) -> String {
    let mut message = format!(
        "Processed {} records containing {} documents, in {:.1} seconds",
        outcome.records, outcome.documents, outcome.elapsed_secs
    );
    if outcome.partial {
        if let Some(last) = outcome.last_indexed {
            message.push_str(&format!(" (not complete; done to {})", format_time(last, DATE_FORMAT)));
        }
    }
    message.push('.');
    message
}

fn format_time(ts: Timestamp, format: &str) -> String {
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| ts.to_string())
}
