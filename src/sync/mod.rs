//! # Background Sync
//!
//! Periodic driver for the offline queue. Every `sync_interval` the worker
//! checks connectivity, backlog and the processing flag, and drains the queue
//! when all three allow it. Enqueues and `force_sync` trigger drains on their
//! own; the timer picks up whatever they leave behind, such as entries queued
//! while offline.
//!
//! ## Components
//!
//! - **Network Monitor**: online/offline flag read by the queue
//! - **Sync State**: observable snapshot and subscriber registry
//! - **Metrics**: cycle outcome counters
//!
//! ## Usage
//!
//! ```rust,no_run
//! use offline_queue::offline::OfflineQueue;
//! use offline_queue::shared::QueueConfig;
//! use offline_queue::sync::{NetworkMonitor, SyncWorker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let queue = OfflineQueue::from_config(QueueConfig::from_env()?, NetworkMonitor::online())?;
//! let mut worker = SyncWorker::new(queue.clone());
//! worker.start()?;
//! // ...
//! worker.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod network_monitor;
pub mod sync_state;

pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use network_monitor::{Connectivity, NetworkMonitor, NetworkStatus};
pub use sync_state::{ErrorKind, LastError, Listener, QueueState, Subscribers, Subscription};

use crate::offline::OfflineQueue;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Worker lifecycle errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("sync worker is already running")]
    AlreadyRunning,
    #[error("no async runtime available")]
    NoRuntime,
}

/// Periodic sync driver for one queue
#[derive(Debug)]
pub struct SyncWorker {
    queue: OfflineQueue,
    interval: Duration,
    background_task: Option<JoinHandle<()>>,
}

impl SyncWorker {
    /// Worker ticking at the queue's configured `sync_interval`
    pub fn new(queue: OfflineQueue) -> Self {
        let interval = queue.config().sync_interval;
        Self::with_interval(queue, interval)
    }

    pub fn with_interval(queue: OfflineQueue, interval: Duration) -> Self {
        Self {
            queue,
            interval,
            background_task: None,
        }
    }

    /// Spawn the timer loop on the current runtime
    pub fn start(&mut self) -> Result<(), SyncError> {
        if self.is_running() {
            return Err(SyncError::AlreadyRunning);
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let queue = self.queue.clone();
        let interval = self.interval;

        self.background_task = Some(handle.spawn(async move {
            Self::background_sync_loop(queue, interval).await;
        }));

        tracing::info!("Sync worker started (every {:?})", self.interval);
        Ok(())
    }

    /// Stop the timer loop. A send in flight is abandoned; its entry stays queued.
    pub async fn stop(&mut self) {
        if let Some(handle) = self.background_task.take() {
            handle.abort();
            let _ = handle.await;
            tracing::info!("Sync worker stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.background_task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    async fn background_sync_loop(queue: OfflineQueue, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if queue.sync_if_ready().await {
                tracing::debug!("Scheduled sync finished; {} request(s) left", queue.len());
            }
        }
    }
}

impl Drop for SyncWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.background_task.take() {
            handle.abort();
        }
    }
}
