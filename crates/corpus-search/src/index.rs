//! On-disk Tantivy index holding the corpus documents.

use std::path::{Path, PathBuf};

use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy};
use tracing::{debug, info};

use crate::error::BackendError;
use crate::schema::{build_corpus_schema, CorpusSchema};

const WRITER_HEAP_MB: usize = 50;
const META_FILE: &str = "meta.json";

#[derive(Debug, Clone)]
pub struct SearchIndexConfig {
    pub index_path: PathBuf,
    /// Heap handed to each writer, in megabytes.
    pub writer_memory_mb: usize,
}

impl SearchIndexConfig {
    pub fn new(index_path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: index_path.into(),
            writer_memory_mb: WRITER_HEAP_MB,
        }
    }

    pub fn with_memory_mb(self, writer_memory_mb: usize) -> Self {
        Self {
            writer_memory_mb,
            ..self
        }
    }
}

/// A corpus index directory together with its resolved field handles.
pub struct SearchIndex {
    index: Index,
    schema: CorpusSchema,
    config: SearchIndexConfig,
}

impl SearchIndex {
    pub fn open_or_create(config: SearchIndexConfig) -> Result<Self, BackendError> {
        let index = open_or_create_index(&config.index_path)?;
        // Field handles come from the stored schema, not a fresh build
        let schema = CorpusSchema::from_schema(index.schema())?;
        info!(
            path = %config.index_path.display(),
            writer_memory_mb = config.writer_memory_mb,
            "Search index ready"
        );
        Ok(Self {
            index,
            schema,
            config,
        })
    }

    pub fn schema(&self) -> &CorpusSchema {
        &self.schema
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn writer(&self) -> Result<IndexWriter, BackendError> {
        Ok(self.index.writer(self.config.writer_memory_mb << 20)?)
    }

    /// Readers only see new segments after an explicit `reload()`.
    pub fn reader(&self) -> Result<IndexReader, BackendError> {
        Ok(self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?)
    }

    pub fn path(&self) -> &Path {
        &self.config.index_path
    }

    pub fn exists(&self) -> bool {
        has_index_meta(self.path())
    }
}

fn has_index_meta(dir: &Path) -> bool {
    dir.join(META_FILE).is_file()
}

/// Opens the index stored in `dir`, creating the directory and an empty
/// corpus index when none is there yet.
pub fn open_or_create_index(dir: &Path) -> Result<Index, BackendError> {
    if has_index_meta(dir) {
        debug!(path = %dir.display(), "Reusing search index");
        return Ok(Index::open_in_dir(dir)?);
    }
    std::fs::create_dir_all(dir)?;
    info!(path = %dir.display(), "Creating empty search index");
    Ok(Index::create_in_dir(dir, build_corpus_schema().schema().clone())?)
}
