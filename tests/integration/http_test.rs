//! HTTP replay tests
//!
//! Drive `OfflineQueue` with the reqwest transport against a wiremock server.

use offline_queue::offline::{ReqwestTransport, Transport};
use offline_queue::sync::ErrorKind;
use offline_queue::{NetworkMonitor, NewRequest, OfflineQueue, QueueConfig};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(dir: &std::path::Path, base_url: &str) -> QueueConfig {
    QueueConfig::builder()
        .storage_dir(dir)
        .api_base_url(base_url)
        .drain_delay(Duration::from_millis(5))
        .request_timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn queue_for(server: &MockServer, dir: &std::path::Path) -> (OfflineQueue, NetworkMonitor) {
    let monitor = NetworkMonitor::offline();
    let queue = OfflineQueue::from_config(config(dir, &server.uri()), monitor.clone()).unwrap();
    (queue, monitor)
}

#[tokio::test]
async fn test_replays_json_body_with_default_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"msisdn": "0241234567", "volume": "10GB"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (queue, monitor) = queue_for(&server, dir.path());
    queue.add_request(
        NewRequest::post("/api/orders")
            .body(serde_json::json!({"msisdn": "0241234567", "volume": "10GB"})),
    );

    monitor.set_online(true);
    queue.drain().await;

    assert!(queue.is_empty());
    assert_eq!(queue.metrics().delivered, 1);
}

#[tokio::test]
async fn test_caller_headers_override_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/commissions/3"))
        .and(header("content-type", "application/merge-patch+json"))
        .and(header("authorization", "Bearer agent-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (queue, monitor) = queue_for(&server, dir.path());
    queue.add_request(
        NewRequest::put("/api/commissions/3")
            .header("Content-Type", "application/merge-patch+json")
            .header("Authorization", "Bearer agent-token")
            .body(serde_json::json!({"rate": 0.05})),
    );

    monitor.set_online(true);
    queue.drain().await;

    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/topup"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/wallet/topup"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (queue, monitor) = queue_for(&server, dir.path());
    queue.add_request(NewRequest::post("/api/wallet/topup").max_retries(5));

    monitor.set_online(true);
    queue.drain().await;

    let metrics = queue.metrics();
    assert!(queue.is_empty());
    assert_eq!(metrics.retried, 1);
    assert_eq!(metrics.delivered, 1);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/orders/77"))
        .respond_with(ResponseTemplate::new(422))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (queue, monitor) = queue_for(&server, dir.path());
    queue.add_request(NewRequest::delete("/api/orders/77").max_retries(5));

    monitor.set_online(true);
    queue.drain().await;

    assert!(queue.is_empty());
    assert_eq!(queue.last_error().unwrap().kind, ErrorKind::Rejected);
}

#[tokio::test]
async fn test_unreachable_server_exhausts_retries() {
    // Bind then drop a listener so the port is known to refuse connections
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dir = tempfile::tempdir().unwrap();
    let base = format!("http://127.0.0.1:{}", port);
    let monitor = NetworkMonitor::offline();
    let queue = OfflineQueue::from_config(config(dir.path(), &base), monitor.clone()).unwrap();
    queue.add_request(NewRequest::post("/api/orders").max_retries(2));

    monitor.set_online(true);
    queue.drain().await;

    assert!(queue.is_empty());
    assert_eq!(queue.metrics().retried, 1);
    assert_eq!(queue.metrics().dropped, 1);
    assert_eq!(queue.last_error().unwrap().kind, ErrorKind::Exhausted);
}

#[tokio::test]
async fn test_transport_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let transport = ReqwestTransport::new(&config(dir.path(), &server.uri())).unwrap();
    let (queue, _) = queue_for(&server, dir.path());
    let id = queue.add_request(NewRequest::patch("/api/agents/5"));
    let request = queue.get(&id).unwrap();

    let response = transport.send(&request).await.unwrap();
    assert_eq!(response.status, 503);
    assert!(response.is_server_error());
}
