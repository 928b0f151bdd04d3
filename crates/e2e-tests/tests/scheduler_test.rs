//! The recurring jobs driving the indexing core.

use std::time::Duration;

use pretty_assertions::assert_eq;

use corpus_scheduler::jobs::{
    create_full_index_job, create_request_job, run_full_index, run_request_processing,
    FullIndexJobConfig, RequestJobConfig, FULL_INDEX_JOB, REQUEST_JOB,
};
use corpus_scheduler::{JobResult, SchedulerConfig, SchedulerService};
use corpus_types::{ContextId, INDEX_PRIORITY_NORMAL};
use e2e_tests::{TestHarness, NOW};

#[tokio::test(flavor = "multi_thread")]
async fn test_jobs_share_one_service() {
    let harness = TestHarness::new();
    let posts = harness.area("mod_forum", "post", "Forum - posts");
    posts.put_item(1, ContextId(20), NOW - 300, "Frog");
    posts.put_item(2, ContextId(21), NOW - 200, "Toad");

    let backend = harness.tantivy_backend();
    let service = harness.service(&[posts.clone()], backend.clone());

    let output = run_full_index(service.clone(), Some(Duration::from_secs(600)))
        .await
        .unwrap();
    assert_eq!(output.metadata["documents"], "2");
    assert_eq!(backend.num_docs(), 2);

    // Reindex one forum on request
    posts.put_item(3, ContextId(20), NOW - 400, "Zombie");
    service
        .request_index(&harness.site.forum1, None, INDEX_PRIORITY_NORMAL)
        .unwrap();
    let output = run_request_processing(service.clone(), Some(Duration::from_secs(60)))
        .await
        .unwrap();
    assert_eq!(output.metadata["completed"], "1");
    assert_eq!(backend.num_docs(), 3);

    // The cursor already passed the older record; only the request found it
    let output = run_full_index(service, None).await.unwrap();
    assert_eq!(output.metadata["records"], "0");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scheduled_tick_indexes() {
    let harness = TestHarness::new();
    let posts = harness.area("mod_forum", "post", "Forum - posts");
    posts.put_item(1, ContextId(20), NOW - 300, "Frog");

    let backend = harness.recording_backend(0);
    let service = harness.service(&[posts], backend.clone());

    let mut scheduler = SchedulerService::new(SchedulerConfig {
        shutdown_timeout_secs: 2,
        ..Default::default()
    })
    .await
    .unwrap();
    create_full_index_job(
        &scheduler,
        service.clone(),
        FullIndexJobConfig::default()
            .with_cron("* * * * * *")
            .with_jitter(0),
    )
    .await
    .unwrap();
    create_request_job(&scheduler, service, RequestJobConfig::default())
        .await
        .unwrap();
    scheduler.pause_job(REQUEST_JOB).unwrap();

    scheduler.start().await.unwrap();
    let registry = scheduler.registry();
    for _ in 0..50 {
        if registry
            .get_status(FULL_INDEX_JOB)
            .is_some_and(|s| s.run_count > 0)
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    scheduler.shutdown().await.unwrap();

    let status = registry.get_status(FULL_INDEX_JOB).unwrap();
    assert!(status.run_count > 0, "job never ran");
    assert_eq!(status.error_count, 0);
    assert!(matches!(status.last_result, Some(JobResult::Success)));
    assert_eq!(backend.added_titles(), vec!["Frog"]);
    assert_eq!(registry.get_status(REQUEST_JOB).unwrap().run_count, 0);
}
