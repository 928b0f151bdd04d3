//! In-memory search area.
//!
//! Holds its records in a vector and builds documents from the `title` and
//! `content` fields of each record's payload. Records whose payload has
//! `"skip": true` produce no document. Used by tests and embedders that
//! push content in directly.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::json;
use tracing::debug;

#[cfg(any(test, feature = "test-util"))]
use corpus_types::ManualClock;
use corpus_types::{AreaId, AreaRecord, ContextId, ContextInfo, ContextLevel, Document, Timestamp};

use crate::area::{RecordStream, SearchArea};
use crate::context_tree::ContextTree;
use crate::error::AreaError;

pub struct MemoryArea {
    id: AreaId,
    visible_name: String,
    levels: Vec<ContextLevel>,
    default_enabled: bool,
    tree: Arc<dyn ContextTree>,
    records: RwLock<Vec<AreaRecord>>,
    /// Simulated query latency applied to a manual clock
    #[cfg(any(test, feature = "test-util"))]
    query_delay: Option<(Arc<ManualClock>, i64)>,
    queries: AtomicUsize,
}

impl MemoryArea {
    pub fn new(
        component: &str,
        area: &str,
        visible_name: impl Into<String>,
        tree: Arc<dyn ContextTree>,
    ) -> Result<Self, AreaError> {
        Ok(Self {
            id: AreaId::generate(component, area)?,
            visible_name: visible_name.into(),
            levels: vec![ContextLevel::Module],
            default_enabled: true,
            tree,
            records: RwLock::new(Vec::new()),
            #[cfg(any(test, feature = "test-util"))]
            query_delay: None,
            queries: AtomicUsize::new(0),
        })
    }

    pub fn with_context_levels(mut self, levels: Vec<ContextLevel>) -> Self {
        self.levels = levels;
        self
    }

    pub fn with_default_enabled(mut self, enabled: bool) -> Self {
        self.default_enabled = enabled;
        self
    }

    /// Advance `clock` by `millis` every time a record set is opened.
    #[cfg(any(test, feature = "test-util"))]
    pub fn with_query_delay(mut self, clock: Arc<ManualClock>, millis: i64) -> Self {
        self.query_delay = Some((clock, millis));
        self
    }

    /// Insert or replace (by item id) a record.
    pub fn upsert(&self, record: AreaRecord) {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.retain(|r| r.item_id != record.item_id);
        records.push(record);
        records.sort_by_key(|r| (r.modified, r.item_id));
    }

    /// Insert or replace an item with a title-only payload.
    pub fn put_item(&self, item_id: u64, context_id: ContextId, modified: Timestamp, title: &str) {
        self.upsert(
            AreaRecord::new(item_id, context_id, modified)
                .with_data(json!({ "title": title, "content": title })),
        );
    }

    pub fn remove(&self, item_id: u64) -> bool {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|r| r.item_id != item_id);
        before != records.len()
    }

    pub fn records(&self) -> Vec<AreaRecord> {
        self.records.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of record sets opened so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn in_subtree(&self, record: &AreaRecord, restriction: &ContextInfo) -> bool {
        self.tree
            .context(record.context_id)
            .map(|ctx| ctx.is_within(restriction.id))
            .unwrap_or(false)
    }
}

impl SearchArea for MemoryArea {
    fn id(&self) -> &AreaId {
        &self.id
    }

    fn visible_name(&self) -> &str {
        &self.visible_name
    }

    fn context_levels(&self) -> &[ContextLevel] {
        &self.levels
    }

    fn default_enabled(&self) -> bool {
        self.default_enabled
    }

    fn document_recordset(
        &self,
        since: Timestamp,
        restriction: Option<&ContextInfo>,
    ) -> Result<Option<RecordStream<'_>>, AreaError> {
        if let Some(context) = restriction {
            if !self.applies_to(context) {
                return Ok(None);
            }
        }

        self.queries.fetch_add(1, Ordering::SeqCst);
        #[cfg(any(test, feature = "test-util"))]
        if let Some((clock, millis)) = &self.query_delay {
            clock.advance_millis(*millis);
        }

        let selected: Vec<AreaRecord> = self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.modified >= since)
            .filter(|r| restriction.map_or(true, |ctx| self.in_subtree(r, ctx)))
            .cloned()
            .collect();

        debug!(area = %self.id, since, count = selected.len(), "Opened record set");
        Ok(Some(Box::new(selected.into_iter().map(Ok))))
    }

    fn build_document(&self, record: &AreaRecord) -> Result<Option<Document>, AreaError> {
        if record.data.get("skip").and_then(|v| v.as_bool()) == Some(true) {
            return Ok(None);
        }
        let course = self
            .tree
            .context(record.context_id)
            .and_then(|context| self.tree.course_of(&context));
        Ok(Some(
            Document::new(
                self.id.clone(),
                record.item_id,
                record.context_id,
                record.field("title").unwrap_or_default(),
                record.field("content").unwrap_or_default(),
                record.modified,
            )
            .with_course(course),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_tree::MemoryContextTree;
    use corpus_types::Clock;

    fn tree() -> Arc<MemoryContextTree> {
        let tree = Arc::new(MemoryContextTree::new());
        tree.add(None, ContextId(1), ContextLevel::System, "System");
        tree.add(Some(ContextId(1)), ContextId(10), ContextLevel::Course, "A");
        tree.add(Some(ContextId(10)), ContextId(11), ContextLevel::Module, "A1");
        tree.add(Some(ContextId(1)), ContextId(20), ContextLevel::Course, "B");
        tree.add(Some(ContextId(20)), ContextId(21), ContextLevel::Module, "B1");
        tree
    }

    fn titles(area: &MemoryArea, since: Timestamp, restriction: Option<&ContextInfo>) -> Vec<String> {
        area.document_recordset(since, restriction)
            .unwrap()
            .unwrap()
            .map(|r| r.unwrap().field("title").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_recordset_is_ascending_and_inclusive() {
        let area = MemoryArea::new("mod_forum", "post", "Forum posts", tree()).unwrap();
        area.put_item(1, ContextId(11), 300, "c");
        area.put_item(2, ContextId(11), 100, "a");
        area.put_item(3, ContextId(21), 200, "b");

        assert_eq!(titles(&area, 0, None), vec!["a", "b", "c"]);
        assert_eq!(titles(&area, 200, None), vec!["b", "c"]);
        assert_eq!(area.query_count(), 2);
    }

    #[test]
    fn test_recordset_restricted_to_subtree() {
        let tree = tree();
        let area = MemoryArea::new("mod_forum", "post", "Forum posts", tree.clone()).unwrap();
        area.put_item(1, ContextId(11), 100, "in-a");
        area.put_item(2, ContextId(21), 100, "in-b");

        let course_a = tree.context(ContextId(10)).unwrap();
        assert_eq!(titles(&area, 0, Some(&course_a)), vec!["in-a"]);
    }

    #[test]
    fn test_recordset_not_relevant() {
        let tree = tree();
        let area = MemoryArea::new("core_user", "profile", "Users", tree.clone())
            .unwrap()
            .with_context_levels(vec![ContextLevel::User]);
        let course = tree.context(ContextId(10)).unwrap();
        assert!(area.document_recordset(0, Some(&course)).unwrap().is_none());
        assert_eq!(area.query_count(), 0);
    }

    #[test]
    fn test_upsert_replaces_item() {
        let area = MemoryArea::new("mod_page", "activity", "Pages", tree()).unwrap();
        area.put_item(1, ContextId(11), 100, "old");
        area.put_item(1, ContextId(11), 150, "new");
        assert_eq!(area.records().len(), 1);
        assert_eq!(titles(&area, 0, None), vec!["new"]);
        assert!(area.remove(1));
        assert!(!area.remove(1));
    }

    #[test]
    fn test_build_document_and_skip() {
        let area = MemoryArea::new("mod_page", "activity", "Pages", tree()).unwrap();
        let record = AreaRecord::new(5, ContextId(11), 100)
            .with_data(json!({"title": "Frog", "content": "green"}));
        let doc = area.build_document(&record).unwrap().unwrap();
        assert_eq!(doc.key, "mod_page-activity-5");
        assert_eq!(doc.title, "Frog");
        assert_eq!(doc.content, "green");
        assert_eq!(doc.course_id, Some(ContextId(10)));

        let skipped = AreaRecord::new(6, ContextId(11), 100).with_data(json!({"skip": true}));
        assert!(area.build_document(&skipped).unwrap().is_none());
    }

    #[test]
    fn test_invalid_area_id_rejected() {
        let err = MemoryArea::new("mod-page", "activity", "Pages", tree()).err().unwrap();
        assert!(matches!(err, AreaError::InvalidId(_)));
        assert!(MemoryArea::new("mod_page", "act:ivity", "Pages", tree()).is_err());
    }

    #[test]
    fn test_query_delay_advances_clock() {
        let clock = Arc::new(ManualClock::at(1_000));
        let area = MemoryArea::new("mod_page", "activity", "Pages", tree())
            .unwrap()
            .with_query_delay(clock.clone(), 10_100);
        let _ = area.document_recordset(0, None).unwrap();
        assert_eq!(clock.now_millis(), 1_010_100);
    }
}
