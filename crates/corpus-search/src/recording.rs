//! In-memory backend that records every call.
//!
//! Keeps the current document set by key plus an ordered log of adds, so
//! tests can assert both "what is indexed" and "what was sent, in which
//! order". A per-document cost can be charged to a [`ManualClock`] to make
//! time budgets bite deterministically, and adds can be made to fail.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use corpus_types::{AreaId, ContextId, Document, ManualClock};

use crate::backend::SearchBackend;
use crate::error::BackendError;

/// A context-scoped delete, as sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    Context(ContextId),
    Course(ContextId),
}

#[derive(Debug, Default)]
struct Recorded {
    documents: BTreeMap<String, Document>,
    added: Vec<Document>,
    deleted_areas: Vec<AreaId>,
    deletions: Vec<Deletion>,
    commits: usize,
    /// Remaining adds before every further add fails
    fail_after: Option<usize>,
}

#[derive(Debug, Default)]
pub struct RecordingBackend {
    state: Mutex<Recorded>,
    add_cost: Option<(Arc<ManualClock>, i64)>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance `clock` by `millis` on every add.
    pub fn with_add_cost(mut self, clock: Arc<ManualClock>, millis: i64) -> Self {
        self.add_cost = Some((clock, millis));
        self
    }

    /// Let `successes` more adds through, then fail every add.
    pub fn fail_after(&self, successes: usize) {
        self.lock().fail_after = Some(successes);
    }

    pub fn stop_failing(&self) {
        self.lock().fail_after = None;
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Titles of every add, in call order.
    pub fn added_titles(&self) -> Vec<String> {
        self.lock().added.iter().map(|d| d.title.clone()).collect()
    }

    pub fn added(&self) -> Vec<Document> {
        self.lock().added.clone()
    }

    /// Forget the add log (not the document set).
    pub fn clear_log(&self) {
        self.lock().added.clear();
    }

    /// Current documents, by key.
    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.values().cloned().collect()
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().documents.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().documents.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn deleted_areas(&self) -> Vec<AreaId> {
        self.lock().deleted_areas.clone()
    }

    pub fn deleted_contexts(&self) -> Vec<ContextId> {
        self.lock()
            .deletions
            .iter()
            .filter_map(|deletion| match deletion {
                Deletion::Context(id) => Some(*id),
                Deletion::Course(_) => None,
            })
            .collect()
    }

    /// Context and course deletes, in call order.
    pub fn deletions(&self) -> Vec<Deletion> {
        self.lock().deletions.clone()
    }

    pub fn commits(&self) -> usize {
        self.lock().commits
    }
}

impl SearchBackend for RecordingBackend {
    fn add_document(&self, document: &Document) -> Result<(), BackendError> {
        {
            let mut state = self.lock();
            match state.fail_after {
                Some(0) => {
                    return Err(BackendError::Rejected {
                        operation: "add_document".to_string(),
                        message: format!("injected failure for {}", document.key),
                    })
                }
                Some(n) => state.fail_after = Some(n - 1),
                None => {}
            }
            state
                .documents
                .insert(document.key.clone(), document.clone());
            state.added.push(document.clone());
        }
        if let Some((clock, millis)) = &self.add_cost {
            clock.advance_millis(*millis);
        }
        Ok(())
    }

    fn delete_document(&self, key: &str) -> Result<(), BackendError> {
        self.lock().documents.remove(key);
        Ok(())
    }

    fn delete_area(&self, area_id: &AreaId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.documents.retain(|_, d| &d.area_id != area_id);
        state.deleted_areas.push(area_id.clone());
        Ok(())
    }

    fn delete_context(&self, context_id: ContextId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.documents.retain(|_, d| d.context_id != context_id);
        state.deletions.push(Deletion::Context(context_id));
        Ok(())
    }

    fn delete_course(&self, course_id: ContextId) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.documents.retain(|_, d| d.course_id != Some(course_id));
        state.deletions.push(Deletion::Course(course_id));
        Ok(())
    }

    fn commit(&self) -> Result<(), BackendError> {
        self.lock().commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus_types::Clock;

    fn doc(area: &str, item: u64, ctx: u64, title: &str) -> Document {
        Document::new(AreaId::parse(area).unwrap(), item, ContextId(ctx), title, "", 100)
    }

    #[test]
    fn test_records_adds_in_order() {
        let backend = RecordingBackend::new();
        backend.add_document(&doc("mod_page-activity", 1, 5, "Frog")).unwrap();
        backend.add_document(&doc("mod_page-activity", 2, 5, "Toad")).unwrap();
        backend.add_document(&doc("mod_page-activity", 1, 5, "Frog again")).unwrap();

        assert_eq!(backend.added_titles(), vec!["Frog", "Toad", "Frog again"]);
        assert_eq!(backend.len(), 2);

        backend.clear_log();
        assert!(backend.added_titles().is_empty());
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_add_cost_advances_clock() {
        let clock = Arc::new(ManualClock::at(1_000));
        let backend = RecordingBackend::new().with_add_cost(clock.clone(), 6_000);
        backend.add_document(&doc("mod_page-activity", 1, 5, "Frog")).unwrap();
        backend.add_document(&doc("mod_page-activity", 2, 5, "Toad")).unwrap();
        assert_eq!(clock.now(), 1_012);
    }

    #[test]
    fn test_fail_after() {
        let backend = RecordingBackend::new();
        backend.fail_after(1);
        backend.add_document(&doc("mod_page-activity", 1, 5, "Frog")).unwrap();
        let err = backend
            .add_document(&doc("mod_page-activity", 2, 5, "Toad"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Rejected { .. }));
        assert_eq!(backend.len(), 1);

        backend.stop_failing();
        backend.add_document(&doc("mod_page-activity", 2, 5, "Toad")).unwrap();
        assert_eq!(backend.len(), 2);
    }

    #[test]
    fn test_deletes() {
        let backend = RecordingBackend::new();
        backend.add_document(&doc("mod_page-activity", 1, 5, "Frog")).unwrap();
        backend.add_document(&doc("mod_forum-post", 1, 6, "Toad")).unwrap();
        backend.add_document(&doc("mod_forum-post", 2, 5, "Zombie")).unwrap();

        backend.delete_area(&AreaId::parse("mod_page-activity").unwrap()).unwrap();
        assert_eq!(backend.keys(), vec!["mod_forum-post-1", "mod_forum-post-2"]);

        backend.delete_context(ContextId(5)).unwrap();
        assert_eq!(backend.keys(), vec!["mod_forum-post-1"]);
        assert_eq!(backend.deleted_contexts(), vec![ContextId(5)]);

        backend.delete_document("mod_forum-post-1").unwrap();
        assert!(backend.is_empty());
    }

    #[test]
    fn test_delete_course() {
        let backend = RecordingBackend::new();
        let course = Some(ContextId(3));
        backend
            .add_document(&doc("mod_page-activity", 1, 5, "Frog").with_course(course))
            .unwrap();
        backend
            .add_document(&doc("mod_page-activity", 2, 6, "Toad").with_course(course))
            .unwrap();
        backend.add_document(&doc("mod_forum-post", 1, 7, "Zombie")).unwrap();

        backend.delete_context(ContextId(7)).unwrap();
        backend.delete_course(ContextId(3)).unwrap();
        assert!(backend.is_empty());
        assert_eq!(
            backend.deletions(),
            vec![Deletion::Context(ContextId(7)), Deletion::Course(ContextId(3))]
        );
        assert_eq!(backend.deleted_contexts(), vec![ContextId(7)]);
    }
}
