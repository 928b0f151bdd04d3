//! Indexing into a real Tantivy index: updates replace by key, deleted
//! contexts and courses leave the index, full reindex and area reset
//! rebuild it.

use pretty_assertions::assert_eq;

use corpus_areas::{AreaError, SearchArea};
use corpus_indexing::{IndexingError, NoOpProgress};
use corpus_types::{AreaId, ContextId, INDEX_PRIORITY_NORMAL};
use e2e_tests::{TestHarness, NOW};

fn hit_keys(backend: &corpus_search::TantivyBackend, query: &str) -> Vec<String> {
    let mut keys: Vec<String> = backend
        .search(query, 10)
        .unwrap()
        .into_iter()
        .map(|hit| hit.key)
        .collect();
    keys.sort();
    keys
}

#[test]
fn test_index_update_delete_rebuild() {
    let harness = TestHarness::new();
    let posts = harness.area("mod_forum", "post", "Forum - posts");
    let pages = harness.area("mod_page", "activity", "Page");
    posts.put_item(1, ContextId(20), NOW - 300, "Frog spotted near the pond");
    posts.put_item(2, ContextId(21), NOW - 200, "Toad hiding under a log");
    pages.put_item(1, ContextId(23), NOW - 100, "Reading list about tadpoles");

    let backend = harness.tantivy_backend();
    let service = harness.service(&[posts.clone(), pages.clone()], backend.clone());

    // Initial pass
    let summary = service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(summary.documents(), 3);
    assert_eq!(backend.num_docs(), 3);
    assert_eq!(hit_keys(&backend, "frog"), vec!["mod_forum-post-1"]);
    assert_eq!(hit_keys(&backend, "tadpoles"), vec!["mod_page-activity-1"]);

    // An edited post replaces its document
    posts.put_item(1, ContextId(20), NOW + 10, "Frog turned into a prince");
    harness.clock.set(NOW + 100);
    let summary = service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(summary.records(), 1);
    assert_eq!(backend.num_docs(), 3);
    assert_eq!(hit_keys(&backend, "prince"), vec!["mod_forum-post-1"]);
    assert!(hit_keys(&backend, "pond").is_empty());

    // Deleting the swamp forum drops its post and its pending request
    service
        .request_index(&harness.site.forum2, None, INDEX_PRIORITY_NORMAL)
        .unwrap();
    posts.remove(2);
    let dropped = service.context_deleted(&harness.site.forum2).unwrap();
    assert_eq!(dropped, 1);
    assert_eq!(backend.num_docs(), 2);
    assert!(hit_keys(&backend, "toad").is_empty());

    // Full reindex rebuilds every area and clears the queue
    service
        .request_index(&harness.site.course, None, INDEX_PRIORITY_NORMAL)
        .unwrap();
    let summary = service.index(true, None, &NoOpProgress).unwrap();
    assert_eq!(summary.documents(), 2);
    assert_eq!(backend.num_docs(), 2);
    assert!(service.queue().is_empty().unwrap());
    assert_eq!(
        service.registry().state(posts.id()).unwrap().last_index_run,
        NOW + 10
    );

    // Reset one area: the next incremental run re-sends its documents
    service.reset_area(Some(pages.id())).unwrap();
    assert!(!service.registry().state(pages.id()).unwrap().has_run());
    let summary = service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(summary.records(), 1);
    assert_eq!(backend.num_docs(), 2);
    assert_eq!(hit_keys(&backend, "tadpoles"), vec!["mod_page-activity-1"]);
}

#[test]
fn test_disabled_and_unknown_areas() {
    let harness = TestHarness::new();
    let posts = harness.area("mod_forum", "post", "Forum - posts");
    let pages = harness.area("mod_page", "activity", "Page");
    posts.put_item(1, ContextId(20), NOW - 300, "Frog");
    pages.put_item(1, ContextId(23), NOW - 100, "Tadpole");

    let backend = harness.tantivy_backend();
    let service = harness.service(&[posts.clone(), pages.clone()], backend.clone());

    service.set_area_enabled(pages.id(), false).unwrap();
    let summary = service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(summary.areas.len(), 1);
    assert_eq!(hit_keys(&backend, "frog"), vec!["mod_forum-post-1"]);
    assert!(hit_keys(&backend, "tadpole").is_empty());

    service.set_area_enabled(pages.id(), true).unwrap();
    service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(hit_keys(&backend, "tadpole"), vec!["mod_page-activity-1"]);

    let missing = AreaId::generate("mod_unexisting", "chihuaquita").unwrap();
    let err = service.reset_area(Some(&missing)).unwrap_err();
    assert!(matches!(err, IndexingError::Area(AreaError::AreaNotFound(_))));
    assert_eq!(
        err.to_string(),
        "Area error: mod_unexisting-chihuaquita search area is not available."
    );
    let err = service.set_area_enabled(&missing, true).unwrap_err();
    assert!(matches!(err, IndexingError::Area(AreaError::AreaNotFound(_))));
}

#[test]
fn test_course_deletion_removes_course_documents() {
    let harness = TestHarness::new();
    let posts = harness.area("mod_forum", "post", "Forum - posts");
    let pages = harness.area("mod_page", "activity", "Page");
    posts.put_item(1, ContextId(20), NOW - 300, "Frog spotted near the pond");
    posts.put_item(2, ContextId(21), NOW - 200, "Toad hiding under a log");
    pages.put_item(1, ContextId(23), NOW - 100, "Reading list about tadpoles");

    let backend = harness.tantivy_backend();
    let service = harness.service(&[posts.clone(), pages.clone()], backend.clone());
    service.index(false, None, &NoOpProgress).unwrap();
    assert_eq!(backend.num_docs(), 3);
    service
        .request_index(&harness.site.page, None, INDEX_PRIORITY_NORMAL)
        .unwrap();

    // Module deletions inside the course leave the index alone
    service.course_deleting_start(harness.site.course.id);
    for context in [&harness.site.forum1, &harness.site.forum2, &harness.site.page] {
        service.context_deleted(context).unwrap();
    }
    assert_eq!(backend.num_docs(), 3);
    assert!(service.queue().is_empty().unwrap());

    service.course_deleting_finish(harness.site.course.id).unwrap();
    assert_eq!(backend.num_docs(), 0);
    assert!(hit_keys(&backend, "tadpoles").is_empty());
}
