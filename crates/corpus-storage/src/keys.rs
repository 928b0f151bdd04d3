//! Key encoding and decoding for storage layer.
//!
//! - area state: `area:{area_id}`
//! - requests:   `req:{context_id:020}:{area_id | *}`
//! - leases:     `lease:{name}`
//!
//! Request keys start with the zero-padded context id so every row for one
//! context is found with a single prefix scan, and the key itself enforces
//! uniqueness of `(context, area)`.

use corpus_types::{AreaId, ContextId};

use crate::error::StorageError;

const ALL_AREAS: &str = "*";

/// Key for area state rows
/// Format: area:{area_id}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaStateKey {
    pub area_id: AreaId,
}

impl AreaStateKey {
    pub fn new(area_id: AreaId) -> Self {
        Self { area_id }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("area:{}", self.area_id).into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let id = s
            .strip_prefix("area:")
            .ok_or_else(|| StorageError::Key(format!("Invalid area key format: {}", s)))?;
        let area_id =
            AreaId::parse(id).map_err(|e| StorageError::Key(format!("Invalid area id: {}", e)))?;
        Ok(Self { area_id })
    }
}

/// Key for queued index requests
/// Format: req:{context_id:020}:{area_id | *}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestKey {
    pub context_id: ContextId,
    /// `None` means all areas
    pub search_area: Option<AreaId>,
}

impl RequestKey {
    pub fn new(context_id: ContextId, search_area: Option<AreaId>) -> Self {
        Self {
            context_id,
            search_area,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let area = self
            .search_area
            .as_ref()
            .map(|a| a.as_str())
            .unwrap_or(ALL_AREAS);
        format!("req:{:020}:{}", self.context_id.0, area).into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "req" {
            return Err(StorageError::Key(format!("Invalid request key format: {}", s)));
        }

        let context_id: u64 = parts[1]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid context id: {}", e)))?;
        let search_area = match parts[2] {
            ALL_AREAS => None,
            area => Some(
                AreaId::parse(area)
                    .map_err(|e| StorageError::Key(format!("Invalid area id: {}", e)))?,
            ),
        };

        Ok(Self {
            context_id: ContextId(context_id),
            search_area,
        })
    }

    /// Prefix shared by every request row of one context.
    pub fn context_prefix(context_id: ContextId) -> Vec<u8> {
        format!("req:{:020}:", context_id.0).into_bytes()
    }

    /// Prefix shared by every request row.
    pub fn prefix() -> Vec<u8> {
        b"req:".to_vec()
    }
}

/// Key for run leases
/// Format: lease:{name}
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaseKey {
    pub name: String,
}

impl LeaseKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("lease:{}", self.name).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_state_key_roundtrip() {
        let key = AreaStateKey::new(AreaId::generate("mod_forum", "post").unwrap());
        assert_eq!(key.to_bytes(), b"area:mod_forum-post".to_vec());
        assert_eq!(AreaStateKey::from_bytes(&key.to_bytes()).unwrap(), key);
    }

    #[test]
    fn test_request_key_format() {
        let all = RequestKey::new(ContextId(42), None);
        assert_eq!(
            String::from_utf8(all.to_bytes()).unwrap(),
            "req:00000000000000000042:*"
        );
        assert_eq!(RequestKey::from_bytes(&all.to_bytes()).unwrap(), all);

        let one = RequestKey::new(ContextId(42), Some(AreaId::generate("mod_page", "activity").unwrap()));
        assert_eq!(RequestKey::from_bytes(&one.to_bytes()).unwrap(), one);
        assert!(one.to_bytes().starts_with(&RequestKey::context_prefix(ContextId(42))));
    }

    #[test]
    fn test_request_key_prefix_does_not_collide() {
        // Context 4 must not match rows of context 42
        let key = RequestKey::new(ContextId(42), None);
        assert!(!key.to_bytes().starts_with(&RequestKey::context_prefix(ContextId(4))));
    }

    #[test]
    fn test_request_key_invalid() {
        assert!(RequestKey::from_bytes(b"req:abc:*").is_err());
        assert!(RequestKey::from_bytes(b"outbox:1").is_err());
        assert!(RequestKey::from_bytes(b"req:1:nodash").is_err());
    }
}
