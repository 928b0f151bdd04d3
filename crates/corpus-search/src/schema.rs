//! Tantivy schema for indexed documents.

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

use crate::error::BackendError;

/// Schema field handles
#[derive(Debug, Clone)]
pub struct CorpusSchema {
    schema: Schema,
    /// Primary key `{area_id}-{item_id}` (STRING | STORED)
    pub key: Field,
    /// Owning area (STRING | STORED), used for area-wide deletes
    pub area_id: Field,
    /// Item id within the area (STRING | STORED)
    pub item_id: Field,
    /// Context id as decimal string (STRING | STORED)
    pub context_id: Field,
    /// Enclosing course context, absent outside courses (STRING)
    pub course_id: Field,
    pub title: Field,
    pub content: Field,
    /// Modification time in seconds (STRING | STORED)
    pub modified: Field,
}

impl CorpusSchema {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve field handles from an existing index schema.
    pub fn from_schema(schema: Schema) -> Result<Self, BackendError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| BackendError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            key: field("key")?,
            area_id: field("area_id")?,
            item_id: field("item_id")?,
            context_id: field("context_id")?,
            course_id: field("course_id")?,
            title: field("title")?,
            content: field("content")?,
            modified: field("modified")?,
            schema,
        })
    }
}

/// Build the document schema.
pub fn build_corpus_schema() -> CorpusSchema {
    let mut schema_builder = Schema::builder();

    let key = schema_builder.add_text_field("key", STRING | STORED);
    let area_id = schema_builder.add_text_field("area_id", STRING | STORED);
    let item_id = schema_builder.add_text_field("item_id", STRING | STORED);
    let context_id = schema_builder.add_text_field("context_id", STRING | STORED);
    let course_id = schema_builder.add_text_field("course_id", STRING);
    let title = schema_builder.add_text_field("title", TEXT | STORED);
    let content = schema_builder.add_text_field("content", TEXT);
    let modified = schema_builder.add_text_field("modified", STRING | STORED);

    CorpusSchema {
        schema: schema_builder.build(),
        key,
        area_id,
        item_id,
        context_id,
        course_id,
        title,
        content,
        modified,
    }
}
