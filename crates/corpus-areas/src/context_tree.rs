//! Context resolution.

use std::collections::HashMap;
use std::sync::RwLock;

use corpus_types::{ContextId, ContextInfo, ContextLevel};

/// Resolves context ids to their place in the hierarchy.
pub trait ContextTree: Send + Sync {
    /// `None` when the context does not exist (or was deleted).
    fn context(&self, id: ContextId) -> Option<ContextInfo>;

    /// Nearest course-level context on the path of `context`, itself included.
    fn course_of(&self, context: &ContextInfo) -> Option<ContextId> {
        if context.level == ContextLevel::Course {
            return Some(context.id);
        }
        context.ancestors().find(|id| {
            self.context(*id)
                .is_some_and(|info| info.level == ContextLevel::Course)
        })
    }
}

/// In-memory context hierarchy.
#[derive(Debug, Default)]
pub struct MemoryContextTree {
    nodes: RwLock<HashMap<ContextId, ContextInfo>>,
}

impl MemoryContextTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a context under `parent` (or as a root). Returns `None` if the
    /// parent is unknown.
    pub fn add(
        &self,
        parent: Option<ContextId>,
        id: ContextId,
        level: ContextLevel,
        name: impl Into<String>,
    ) -> Option<ContextInfo> {
        let info = match parent {
            Some(parent_id) => {
                let parent = self.context(parent_id)?;
                ContextInfo::child_of(&parent, id, level, name)
            }
            None => ContextInfo::root(id, level, name),
        };
        self.insert(info.clone());
        Some(info)
    }

    pub fn insert(&self, info: ContextInfo) {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        nodes.insert(info.id, info);
    }

    /// Remove a context and its whole subtree. Returns how many were removed.
    pub fn remove(&self, id: ContextId) -> usize {
        let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
        let before = nodes.len();
        nodes.retain(|_, info| !info.is_within(id));
        before - nodes.len()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContextTree for MemoryContextTree {
    fn context(&self, id: ContextId) -> Option<ContextInfo> {
        let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
        nodes.get(&id).cloned()
    }
}
