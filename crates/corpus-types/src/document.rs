//! Records yielded by search areas and documents sent to the backend.

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;
use crate::ids::{AreaId, ContextId};
use crate::Timestamp;

/// One changed item as yielded by an area's record sequence.
///
/// Areas yield records in ascending `modified` order. `data` carries the
/// area-specific payload the document builder needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub item_id: u64,
    pub context_id: ContextId,
    pub modified: Timestamp,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl AreaRecord {
    pub fn new(item_id: u64, context_id: ContextId, modified: Timestamp) -> Self {
        Self {
            item_id,
            context_id,
            modified,
            data: serde_json::Value::Null,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    /// String field of the payload, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(|v| v.as_str())
    }
}

/// A searchable document built from a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Backend key: `{area_id}-{item_id}`
    pub key: String,
    pub area_id: AreaId,
    pub item_id: u64,
    pub context_id: ContextId,
    pub title: String,
    pub content: String,
    pub modified: Timestamp,
    /// Course context enclosing `context_id`, when there is one.
    #[serde(default)]
    pub course_id: Option<ContextId>,
}

impl Document {
    pub fn new(
        area_id: AreaId,
        item_id: u64,
        context_id: ContextId,
        title: impl Into<String>,
        content: impl Into<String>,
        modified: Timestamp,
    ) -> Self {
        Self {
            key: Self::key_for(&area_id, item_id),
            area_id,
            item_id,
            context_id,
            title: title.into(),
            content: content.into(),
            modified,
            course_id: None,
        }
    }

    pub fn with_course(mut self, course_id: Option<ContextId>) -> Self {
        self.course_id = course_id;
        self
    }

    /// Backend key for an item of an area.
    pub fn key_for(area_id: &AreaId, item_id: u64) -> String {
        format!("{}-{}", area_id, item_id)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CorpusError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CorpusError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
