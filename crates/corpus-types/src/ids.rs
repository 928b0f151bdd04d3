//! Identifiers for search areas and contexts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CorpusError;

/// Identifier of a search area.
///
/// Format: `{component}-{area}`, e.g. `mod_forum-post` or
/// `core_course-course`. Ordering is by the full string, which gives the
/// stable area order used by context-scoped indexing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AreaId(String);

impl AreaId {
    /// Build an area id from its component and area name. Neither part may
    /// be empty or contain `-` or `:`.
    pub fn generate(component: &str, area: &str) -> Result<Self, CorpusError> {
        Self::parse(&format!("{}-{}", component, area))
    }

    /// Parse and validate an area id.
    pub fn parse(s: &str) -> Result<Self, CorpusError> {
        // `:` separates the parts of storage keys
        if s.contains(':') {
            return Err(CorpusError::InvalidAreaId(s.to_string()));
        }
        let mut parts = s.split('-');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(component), Some(area), None) if !component.is_empty() && !area.is_empty() => {
                Ok(Self(s.to_string()))
            }
            _ => Err(CorpusError::InvalidAreaId(s.to_string())),
        }
    }

    /// Component half of the id (`mod_forum` in `mod_forum-post`).
    pub fn component(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }

    /// Area half of the id (`post` in `mod_forum-post`).
    pub fn area(&self) -> &str {
        self.0.split('-').nth(1).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AreaId {
    type Err = CorpusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AreaId {
    type Error = CorpusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<AreaId> for String {
    fn from(id: AreaId) -> Self {
        id.0
    }
}

/// Identifier of a node in the content hierarchy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContextId(pub u64);

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ContextId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
