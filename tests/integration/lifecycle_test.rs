//! Queue lifecycle tests
//!
//! Enqueue, removal, clearing, retry bookkeeping and reload over real file storage.

use crate::common::*;
use assert_matches::assert_matches;
use offline_queue::offline::FileStorage;
use offline_queue::offline::QueueStorage;
use offline_queue::sync::ErrorKind;
use offline_queue::{CycleReport, NewRequest, Priority, QueuedRequest};
use pretty_assertions::assert_eq;

fn urls(requests: &[QueuedRequest]) -> Vec<&str> {
    requests.iter().map(|r| r.url.as_str()).collect()
}

#[tokio::test]
async fn test_priority_bucketed_fifo() {
    let (queue, _) = memory_queue(ScriptedTransport::new(&[]));

    queue.add_request(NewRequest::post("high1").priority(Priority::High));
    queue.add_request(NewRequest::post("low").priority(Priority::Low));
    queue.add_request(NewRequest::post("high2").priority(Priority::High));
    queue.add_request(NewRequest::post("medium").priority(Priority::Medium));

    assert_eq!(urls(&queue.state().queue), vec!["high1", "high2", "medium", "low"]);
}

#[tokio::test]
async fn test_add_remove_persists_empty_array() {
    let dir = tempfile::tempdir().unwrap();
    let (queue, _) = file_queue(dir.path(), ScriptedTransport::new(&[]));

    let id = queue.add_request(NewRequest::post("/api/orders/bulk"));
    assert!(queue.remove_request(&id));

    assert!(queue.is_empty());
    let stored = FileStorage::new(dir.path()).read(TEST_KEY).unwrap();
    assert_eq!(stored.as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_evicted_after_max_retries_of_server_errors() {
    let transport = ScriptedTransport::new(&[500, 500, 500]);
    let (queue, _) = memory_queue(transport.clone());
    let id = queue.add_request(NewRequest::post("/api/orders").max_retries(3));

    queue.process_once().await;
    assert!(queue.get(&id).is_some(), "present after cycle 1");
    queue.process_once().await;
    assert!(queue.get(&id).is_some(), "present after cycle 2");
    queue.process_once().await;
    assert!(queue.get(&id).is_none(), "absent after cycle 3");

    assert_eq!(transport.calls(), 3);
    assert_eq!(queue.metrics().dropped, 1);
}

#[tokio::test]
async fn test_not_found_evicts_after_one_cycle() {
    let (queue, _) = memory_queue(ScriptedTransport::new(&[404]));
    let id = queue.add_request(NewRequest::delete("/api/agents/17").max_retries(50));

    assert_eq!(
        queue.process_once().await,
        CycleReport::Rejected { id: id.clone(), status: 404 }
    );
    assert!(queue.is_empty());
    let error = queue.last_error().unwrap();
    assert_eq!(error.kind, ErrorKind::Rejected);
    assert_eq!(error.request_id, Some(id));
}

#[tokio::test]
async fn test_success_on_second_attempt() {
    let (queue, _) = memory_queue(ScriptedTransport::new(&[500, 200]));
    let id = queue.add_request(NewRequest::post("/api/wallet/fund").max_retries(5));

    queue.process_once().await;
    assert_eq!(queue.get(&id).unwrap().retry_count, 1);

    assert_matches!(
        queue.process_once().await,
        CycleReport::Delivered { retry_count: 1, status: 200, .. }
    );
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let (queue, _) = file_queue(dir.path(), ScriptedTransport::new(&[]));
    queue.add_request(NewRequest::post("/a"));
    queue.add_request(NewRequest::post("/b"));

    queue.clear_queue();
    assert!(queue.is_empty());
    queue.clear_queue();
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_reload_from_file_storage() {
    let dir = tempfile::tempdir().unwrap();

    let before = {
        let (queue, _) = file_queue(dir.path(), ScriptedTransport::new(&[503]));
        queue.add_request(
            NewRequest::post("/api/orders")
                .body(serde_json::json!({"msisdn": "0241234567", "bundle": "5GB"}))
                .priority(Priority::High),
        );
        queue.add_request(NewRequest::put("/api/commissions/9").header("X-Agent", "9"));
        queue.add_request(NewRequest::patch("/api/wallet").priority(Priority::Low));

        queue.process_once().await;
        let state = queue.state();
        assert!(state.last_sync_attempt.is_some());
        state.queue
    };

    let (reloaded, _) = file_queue(dir.path(), ScriptedTransport::new(&[]));
    let after = reloaded.state();

    assert_eq!(after.queue, before);
    assert_eq!(after.queue.len(), 3);
    assert_eq!(after.queue[0].retry_count, 1);
    assert!(!after.is_processing);
    assert!(after.last_sync_attempt.is_none());
}

#[tokio::test]
async fn test_corrupt_file_loads_empty_queue() {
    let dir = tempfile::tempdir().unwrap();
    FileStorage::new(dir.path()).write(TEST_KEY, "[{\"id\": ").unwrap();

    let (queue, _) = file_queue(dir.path(), ScriptedTransport::new(&[]));

    assert!(queue.is_empty());
    assert_eq!(queue.last_error().unwrap().kind, ErrorKind::CorruptState);

    queue.add_request(NewRequest::post("/a"));
    let (reloaded, _) = file_queue(dir.path(), ScriptedTransport::new(&[]));
    assert_eq!(reloaded.len(), 1);
}

#[tokio::test]
async fn test_duplicate_requests_are_both_replayed() {
    let transport = ScriptedTransport::new(&[200, 200]);
    let (queue, monitor) = memory_queue(transport.clone());
    let order = NewRequest::post("/api/orders").body(serde_json::json!({"ref": "A1"}));

    let first = queue.add_request(order.clone());
    let second = queue.add_request(order);
    assert_ne!(first, second);

    monitor.set_online(true);
    queue.drain().await;

    assert_eq!(transport.sent_urls(), vec!["/api/orders", "/api/orders"]);
}
