//! End-to-end test infrastructure for the corpus indexer.
//!
//! Provides a shared [`TestHarness`]: RocksDB storage in a temp dir, a
//! manual clock, and a small site (system, category, course, two forums
//! and a page) registered in an in-memory context tree.

use std::path::PathBuf;
use std::sync::{Arc, Once};

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use corpus_areas::{AreaRegistry, MemoryArea, MemoryContextTree};
use corpus_indexing::{IndexingConfig, IndexingService};
use corpus_search::{RecordingBackend, SearchBackend, SearchIndex, SearchIndexConfig, TantivyBackend};
use corpus_storage::Storage;
use corpus_types::{ContextId, ContextInfo, ContextLevel, ManualClock, Settings, Timestamp};

/// Wall clock at the start of every scenario: 2017-07-14 02:40:00 UTC.
pub const NOW: Timestamp = 1_500_000_000;

pub struct SiteContexts {
    pub system: ContextInfo,
    pub course: ContextInfo,
    pub forum1: ContextInfo,
    pub forum2: ContextInfo,
    pub page: ContextInfo,
}

pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: TempDir,
    pub storage: Arc<Storage>,
    pub clock: Arc<ManualClock>,
    pub tree: Arc<MemoryContextTree>,
    pub index_path: PathBuf,
    pub site: SiteContexts,
}

impl TestHarness {
    pub fn new() -> Self {
        init_tracing();

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let storage = Arc::new(
            Storage::open(&temp_dir.path().join("db")).expect("Failed to open test storage"),
        );
        let index_path = temp_dir.path().join("search-index");
        std::fs::create_dir_all(&index_path).expect("Failed to create index dir");

        let tree = Arc::new(MemoryContextTree::new());
        let add = |parent: Option<u64>, id: u64, level: ContextLevel, name: &str| {
            tree.add(parent.map(ContextId), ContextId(id), level, name)
                .expect("Parent context missing")
        };
        let system = add(None, 1, ContextLevel::System, "System");
        add(Some(1), 2, ContextLevel::Category, "Miscellaneous");
        let course = add(Some(2), 10, ContextLevel::Course, "Amphibians 101");
        let forum1 = add(Some(10), 20, ContextLevel::Module, "Pond forum");
        let forum2 = add(Some(10), 21, ContextLevel::Module, "Swamp forum");
        let page = add(Some(10), 23, ContextLevel::Module, "Reading list");

        Self {
            _temp_dir: temp_dir,
            storage,
            clock: Arc::new(ManualClock::at(NOW)),
            tree,
            index_path,
            site: SiteContexts {
                system,
                course,
                forum1,
                forum2,
                page,
            },
        }
    }

    /// A module-level in-memory area.
    pub fn area(&self, component: &str, area: &str, name: &str) -> Arc<MemoryArea> {
        Arc::new(
            MemoryArea::new(component, area, name, self.tree.clone())
                .expect("Invalid area id"),
        )
    }

    pub fn registry(&self, areas: &[Arc<MemoryArea>]) -> Arc<AreaRegistry> {
        let registry = areas
            .iter()
            .try_fold(AreaRegistry::new(self.storage.clone()), |registry, area| {
                registry.with_area(area.clone())
            })
            .expect("Failed to register areas");
        Arc::new(registry)
    }

    /// Service wired to this harness, using the default settings.
    pub fn service(
        &self,
        areas: &[Arc<MemoryArea>],
        backend: Arc<dyn SearchBackend>,
    ) -> Arc<IndexingService> {
        let config = IndexingConfig::from(&Settings::default().indexing);
        Arc::new(IndexingService::new(
            self.registry(areas),
            backend,
            self.tree.clone(),
            self.clock.clone(),
            config,
        ))
    }

    /// Each add advances the harness clock by `add_cost_ms`.
    pub fn recording_backend(&self, add_cost_ms: i64) -> Arc<RecordingBackend> {
        Arc::new(RecordingBackend::new().with_add_cost(self.clock.clone(), add_cost_ms))
    }

    pub fn tantivy_backend(&self) -> Arc<TantivyBackend> {
        let index = SearchIndex::open_or_create(SearchIndexConfig::new(&self.index_path))
            .expect("Failed to open search index");
        Arc::new(TantivyBackend::new(&index).expect("Failed to create backend"))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a test-writer subscriber once. `RUST_LOG` overrides the
/// configured `log_level`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&Settings::default().log_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}
