//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Transport doubles
//! - Queue fixtures over memory or file storage
//! - Polling helpers for background work

pub mod transport;

// Re-export commonly used utilities
pub use transport::*;

use offline_queue::offline::{FileStorage, MemoryStorage, QueueStorage, Transport};
use offline_queue::{NetworkMonitor, OfflineQueue, QueueConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const TEST_KEY: &str = "offline-queue";

pub fn test_config() -> QueueConfig {
    QueueConfig::builder()
        .storage_key(TEST_KEY)
        .sync_interval(Duration::from_millis(50))
        .drain_delay(Duration::from_millis(5))
        .build()
        .expect("test config is valid")
}

/// Queue over `storage`, starting offline so enqueues never send on their own
pub fn offline_queue(
    storage: Arc<dyn QueueStorage>,
    transport: Arc<dyn Transport>,
) -> (OfflineQueue, NetworkMonitor) {
    let monitor = NetworkMonitor::offline();
    let queue = OfflineQueue::new(test_config(), storage, transport, Arc::new(monitor.clone()));
    (queue, monitor)
}

pub fn memory_queue(transport: Arc<dyn Transport>) -> (OfflineQueue, NetworkMonitor) {
    offline_queue(Arc::new(MemoryStorage::new()), transport)
}

pub fn file_queue(dir: &Path, transport: Arc<dyn Transport>) -> (OfflineQueue, NetworkMonitor) {
    offline_queue(Arc::new(FileStorage::new(dir)), transport)
}

/// Poll `condition` until it holds, panicking after two seconds
pub async fn wait_until<F>(mut condition: F, what: &str)
where
    F: FnMut() -> bool,
{
    let waited = tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(waited.is_ok(), "timed out waiting for {}", what);
}
