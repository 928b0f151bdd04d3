//! Tantivy implementation of [`SearchBackend`].
//!
//! Adds delete any previous document with the same key first, so a
//! re-sent document replaces the old one. Changes are visible to
//! [`TantivyBackend::search`] after [`SearchBackend::commit`].

use std::sync::Mutex;

use tantivy::collector::TopDocs;
use tantivy::doc;
use tantivy::query::{AllQuery, QueryParser};
use tantivy::schema::Value;
use tantivy::{IndexReader, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info};

use corpus_types::{AreaId, ContextId, Document};

use crate::backend::SearchBackend;
use crate::error::BackendError;
use crate::index::SearchIndex;
use crate::schema::CorpusSchema;

/// A matching document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    pub score: f32,
}

pub struct TantivyBackend {
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    schema: CorpusSchema,
    query_parser: QueryParser,
}

impl TantivyBackend {
    pub fn new(index: &SearchIndex) -> Result<Self, BackendError> {
        let schema = index.schema().clone();
        let query_parser =
            QueryParser::for_index(index.index(), vec![schema.title, schema.content]);
        Ok(Self {
            writer: Mutex::new(index.writer()?),
            reader: index.reader()?,
            schema,
            query_parser,
        })
    }

    fn to_tantivy(&self, document: &Document) -> TantivyDocument {
        let mut tantivy_doc = doc!(
            self.schema.key => document.key.clone(),
            self.schema.area_id => document.area_id.to_string(),
            self.schema.item_id => document.item_id.to_string(),
            self.schema.context_id => document.context_id.to_string(),
            self.schema.title => document.title.clone(),
            self.schema.content => document.content.clone(),
            self.schema.modified => document.modified.to_string()
        );
        if let Some(course_id) = document.course_id {
            tantivy_doc.add_text(self.schema.course_id, course_id.to_string());
        }
        tantivy_doc
    }

    fn delete_term(&self, term: Term) -> Result<(), BackendError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| BackendError::IndexLocked(e.to_string()))?;
        writer.delete_term(term);
        Ok(())
    }

    /// Number of committed documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Keys of every committed document, sorted.
    pub fn keys(&self) -> Result<Vec<String>, BackendError> {
        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);
        let top_docs = searcher.search(&AllQuery, &TopDocs::with_limit(limit))?;

        let mut keys = Vec::with_capacity(top_docs.len());
        for (_, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(key) = doc.get_first(self.schema.key).and_then(|v| v.as_str()) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Keyword search over title and content.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, BackendError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parsed = self.query_parser.parse_query(query)?;
        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let field = |f| {
                doc.get_first(f)
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string()
            };
            hits.push(SearchHit {
                key: field(self.schema.key),
                title: field(self.schema.title),
                score,
            });
        }
        debug!(query, count = hits.len(), "Search complete");
        Ok(hits)
    }
}

impl SearchBackend for TantivyBackend {
    fn add_document(&self, document: &Document) -> Result<(), BackendError> {
        let tantivy_doc = self.to_tantivy(document);
        let writer = self
            .writer
            .lock()
            .map_err(|e| BackendError::IndexLocked(e.to_string()))?;

        writer.delete_term(Term::from_field_text(self.schema.key, &document.key));
        writer.add_document(tantivy_doc)?;

        debug!(key = %document.key, "Indexed document");
        Ok(())
    }

    fn delete_document(&self, key: &str) -> Result<(), BackendError> {
        self.delete_term(Term::from_field_text(self.schema.key, key))?;
        debug!(key, "Deleted document");
        Ok(())
    }

    fn delete_area(&self, area_id: &AreaId) -> Result<(), BackendError> {
        self.delete_term(Term::from_field_text(self.schema.area_id, area_id.as_str()))?;
        info!(area = %area_id, "Deleted area documents");
        Ok(())
    }

    fn delete_context(&self, context_id: ContextId) -> Result<(), BackendError> {
        self.delete_term(Term::from_field_text(
            self.schema.context_id,
            &context_id.to_string(),
        ))?;
        info!(context = %context_id, "Deleted context documents");
        Ok(())
    }

    fn delete_course(&self, course_id: ContextId) -> Result<(), BackendError> {
        self.delete_term(Term::from_field_text(
            self.schema.course_id,
            &course_id.to_string(),
        ))?;
        info!(course = %course_id, "Deleted course documents");
        Ok(())
    }

    fn commit(&self) -> Result<(), BackendError> {
        let opstamp = {
            let mut writer = self
                .writer
                .lock()
                .map_err(|e| BackendError::IndexLocked(e.to_string()))?;
            writer.commit()?
        };
        self.reader.reload()?;
        debug!(opstamp, "Committed index changes");
        Ok(())
    }
}
