//! # corpus-indexing
//!
//! Incremental, time-boxed indexing of the search corpus.
//!
//! - [`AreaIndexer`]: one area from its cursor, honouring the indexing
//!   delay and the time budget stop rule
//! - [`FullCorpusOrchestrator`]: every enabled area under one deadline,
//!   with per-area checkpointing
//! - [`RequestQueue`]: persisted, priority-ordered reindex requests with
//!   subsumption
//! - [`ContextIndexer`]: one context subtree, resumable
//! - [`RequestProcessor`]: drains the queue under a deadline
//! - [`IndexingService`]: all of the above sharing one set of collaborators
//!
//! Runs are single-threaded and blocking. `index` and `process` each take
//! a persisted lease so only one of each runs at a time.

pub mod area_indexer;
pub mod config;
pub mod context_indexer;
pub mod error;
pub mod lease;
pub mod maintenance;
pub mod orchestrator;
pub mod processor;
pub mod progress;
pub mod queue;
pub mod service;

pub use area_indexer::{deadline, processed_message, AreaIndexOutcome, AreaIndexer};
pub use config::IndexingConfig;
pub use context_indexer::{ContextIndexResult, ContextIndexer};
pub use error::IndexingError;
pub use lease::{LeaseGuard, INDEX_LEASE, REQUESTS_LEASE};
pub use maintenance::ContextDeletions;
pub use orchestrator::{AreaRunReport, FullCorpusOrchestrator, IndexRunSummary};
pub use processor::{ProcessSummary, RequestProcessor};
pub use progress::{BufferedProgress, NoOpProgress, ProgressTrace, TracingProgress};
pub use queue::{RequestOutcome, RequestQueue};
pub use service::IndexingService;
