//! Context hierarchy model.
//!
//! A context is a node in the content tree (system, category, course,
//! module, user, block). Indexing requests target a context and cover its
//! whole subtree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::ContextId;

/// Level of a node in the content hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextLevel {
    System,
    User,
    Category,
    Course,
    Module,
    Block,
}

impl ContextLevel {
    /// Whether a context at this level can have a context at `other` in
    /// its subtree (itself included).
    pub fn may_contain(&self, other: ContextLevel) -> bool {
        use ContextLevel::*;
        match self {
            System => true,
            Category => matches!(other, Category | Course | Module | Block),
            Course => matches!(other, Course | Module | Block),
            Module => matches!(other, Module | Block),
            User => matches!(other, User | Block),
            Block => other == Block,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContextLevel::System => "System",
            ContextLevel::User => "User",
            ContextLevel::Category => "Category",
            ContextLevel::Course => "Course",
            ContextLevel::Module => "Module",
            ContextLevel::Block => "Block",
        }
    }
}

impl fmt::Display for ContextLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A resolved context node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextInfo {
    pub id: ContextId,
    pub level: ContextLevel,
    pub name: String,
    /// Ancestor ids root-first, ending with `id` itself.
    pub path: Vec<ContextId>,
}

impl ContextInfo {
    /// Create a root context (path is just itself).
    pub fn root(id: ContextId, level: ContextLevel, name: impl Into<String>) -> Self {
        Self {
            id,
            level,
            name: name.into(),
            path: vec![id],
        }
    }

    /// Create a context below `parent`.
    pub fn child_of(
        parent: &ContextInfo,
        id: ContextId,
        level: ContextLevel,
        name: impl Into<String>,
    ) -> Self {
        let mut path = parent.path.clone();
        path.push(id);
        Self {
            id,
            level,
            name: name.into(),
            path,
        }
    }

    /// Ancestor ids, nearest first, excluding this context.
    pub fn ancestors(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.path.iter().rev().skip(1).copied()
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.ancestors().next()
    }

    /// True if `other` is this context or lies in its subtree.
    pub fn contains(&self, other: &ContextInfo) -> bool {
        other.path.contains(&self.id)
    }

    /// True if this context is `ancestor` or lies in its subtree.
    pub fn is_within(&self, ancestor: ContextId) -> bool {
        self.path.contains(&ancestor)
    }

    /// Name shown in operator logs, e.g. `Course: Maths 101`.
    pub fn display_name(&self) -> String {
        format!("{}: {}", self.level, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> (ContextInfo, ContextInfo, ContextInfo, ContextInfo) {
        let system = ContextInfo::root(ContextId(1), ContextLevel::System, "System");
        let category =
            ContextInfo::child_of(&system, ContextId(2), ContextLevel::Category, "Misc");
        let course =
            ContextInfo::child_of(&category, ContextId(10), ContextLevel::Course, "TCourse");
        let module = ContextInfo::child_of(&course, ContextId(20), ContextLevel::Module, "Forum");
        (system, category, course, module)
    }

    #[test]
    fn test_ancestors_nearest_first() {
        let (_, _, _, module) = tree();
        let ancestors: Vec<_> = module.ancestors().collect();
        assert_eq!(ancestors, vec![ContextId(10), ContextId(2), ContextId(1)]);
        assert_eq!(module.parent(), Some(ContextId(10)));

        let (system, ..) = tree();
        assert_eq!(system.parent(), None);
    }

    #[test]
    fn test_contains() {
        let (system, category, course, module) = tree();
        assert!(system.contains(&module));
        assert!(category.contains(&course));
        assert!(course.contains(&course));
        assert!(!module.contains(&course));
        assert!(module.is_within(ContextId(2)));
        assert!(!course.is_within(ContextId(20)));
    }

    #[test]
    fn test_level_containment() {
        assert!(ContextLevel::System.may_contain(ContextLevel::User));
        assert!(ContextLevel::Course.may_contain(ContextLevel::Module));
        assert!(ContextLevel::Course.may_contain(ContextLevel::Course));
        assert!(!ContextLevel::Course.may_contain(ContextLevel::Category));
        assert!(!ContextLevel::Module.may_contain(ContextLevel::Course));
        assert!(!ContextLevel::User.may_contain(ContextLevel::Course));
        assert!(ContextLevel::User.may_contain(ContextLevel::Block));
        assert!(!ContextLevel::Block.may_contain(ContextLevel::Module));
    }

    #[test]
    fn test_display_name() {
        let (_, _, course, _) = tree();
        assert_eq!(course.display_name(), "Course: TCourse");
    }
}
