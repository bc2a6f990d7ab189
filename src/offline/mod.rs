//! # Offline Request Queue
//!
//! Buffers mutating HTTP requests made while the client is offline, persists
//! them, and replays them head-first when connectivity is available.
//!
//! ## Architecture
//!
//! - `queue.rs`: priority-bucketed FIFO container
//! - `storage.rs`: durable slot the queue is mirrored into
//! - `transport.rs`: sends one request
//! - `retry.rs`: turns a send result into keep/drop
//!
//! `OfflineQueue` ties them together. It is an explicitly constructed,
//! cloneable handle; the application root builds one and hands clones to
//! whatever needs it.
//!
//! ## Processing
//!
//! One cycle sends `queue[0]` and settles it:
//!
//! 1. check-and-set `is_processing`, stamp `last_sync_attempt`, notify
//! 2. send the head entry (it stays in the queue while in flight)
//! 3. 2xx removes it; 5xx or transport failure bumps `retry_count` and removes
//!    it once `max_retries` is reached; any other status removes it at once
//! 4. clear `is_processing`, notify
//!
//! A drain repeats cycles with `drain_delay` in between while the queue is
//! non-empty and the client is online.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use offline_queue::offline::OfflineQueue;
//! use offline_queue::shared::{NewRequest, Priority, QueueConfig};
//! use offline_queue::sync::NetworkMonitor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = NetworkMonitor::offline();
//! let queue = OfflineQueue::from_config(QueueConfig::from_env()?, monitor.clone())?;
//!
//! let id = queue.add_request(
//!     NewRequest::post("/api/orders")
//!         .body(serde_json::json!({"msisdn": "0241234567", "volume": "5GB"}))
//!         .priority(Priority::High),
//! );
//!
//! monitor.set_online(true);
//! queue.force_sync();
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

pub mod queue;
pub mod retry;
pub mod storage;
pub mod transport;

pub use queue::{QueueStats, RequestQueue};
pub use retry::{RemovalReason, RetryDecision, SendOutcome};
pub use storage::{FileStorage, MemoryStorage, QueueStorage};
pub use transport::{ReqwestTransport, Transport, TransportResponse};

use crate::shared::config::QueueConfig;
use crate::shared::error::QueueError;
use crate::shared::request::{NewRequest, QueuedRequest};
use crate::sync::metrics::{MetricsSnapshot, QueueMetrics};
use crate::sync::network_monitor::Connectivity;
use crate::sync::sync_state::{ErrorKind, LastError, QueueState, Subscribers, Subscription};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Result of one `process_once` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleReport {
    /// Nothing queued
    Idle,
    /// Another cycle is in flight
    Busy,
    /// Head entry delivered and removed; `retry_count` as it was when sent
    Delivered { id: String, status: u16, retry_count: u32 },
    /// Head entry refused by the server and removed
    Rejected { id: String, status: u16 },
    /// Head entry failed transiently and stays queued
    Retrying { id: String, retry_count: u32 },
    /// Head entry hit its retry ceiling and was removed
    Dropped { id: String, retry_count: u32 },
    /// Head entry was removed or cleared while its send was in flight
    Vanished { id: String },
}

/// Mutable queue state guarded by one lock
#[derive(Debug)]
struct Inner {
    queue: RequestQueue,
    is_processing: bool,
    last_sync_attempt: Option<i64>,
    last_error: Option<LastError>,
    metrics: QueueMetrics,
    /// Bumped for every snapshot handed to listeners
    version: u64,
}

struct Shared {
    config: QueueConfig,
    storage: Arc<dyn QueueStorage>,
    transport: Arc<dyn Transport>,
    connectivity: Arc<dyn Connectivity>,
    inner: Mutex<Inner>,
    subscribers: Subscribers,
}

/// Offline request queue manager
#[derive(Clone)]
pub struct OfflineQueue {
    shared: Arc<Shared>,
}

impl fmt::Debug for OfflineQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("OfflineQueue")
            .field("storage_key", &self.shared.config.storage_key)
            .field("pending", &inner.queue.len())
            .field("is_processing", &inner.is_processing)
            .field("subscribers", &self.shared.subscribers)
            .finish()
    }
}

impl OfflineQueue {
    /// Create a queue and hydrate it from `storage`
    pub fn new(
        config: QueueConfig,
        storage: Arc<dyn QueueStorage>,
        transport: Arc<dyn Transport>,
        connectivity: Arc<dyn Connectivity>,
    ) -> Self {
        let (queue, last_error) = hydrate(storage.as_ref(), &config.storage_key);
        info!(
            "Offline queue '{}' loaded with {} pending request(s)",
            config.storage_key,
            queue.len()
        );

        Self {
            shared: Arc::new(Shared {
                config,
                storage,
                transport,
                connectivity,
                inner: Mutex::new(Inner {
                    queue,
                    is_processing: false,
                    last_sync_attempt: None,
                    last_error,
                    metrics: QueueMetrics::new(),
                    version: 0,
                }),
                subscribers: Subscribers::new(),
            }),
        }
    }

    /// File storage in `config.storage_dir` and a reqwest transport
    pub fn from_config<C>(config: QueueConfig, connectivity: C) -> Result<Self, QueueError>
    where
        C: Connectivity + 'static,
    {
        let storage = Arc::new(FileStorage::new(config.storage_dir.clone()));
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::new(config, storage, transport, Arc::new(connectivity)))
    }

    // ========== Mutations ==========

    /// Enqueue a request and return its id.
    ///
    /// Starts a drain in the background when online and idle.
    pub fn add_request(&self, request: NewRequest) -> String {
        let entry = QueuedRequest::from_new(request, self.shared.config.default_max_retries);
        let id = entry.id.clone();

        let (state, idle) = {
            let mut inner = self.lock();
            debug!(
                "Queueing {} {} as {} (priority {})",
                entry.method, entry.url, entry.id, entry.priority
            );
            let position = inner.queue.insert(entry);
            debug!("Request {} queued at position {}", id, position);
            self.persist(&mut inner);
            (publish(&mut inner), !inner.is_processing)
        };
        self.notify(&state);

        if idle && self.is_online() {
            self.spawn_drain();
        }

        id
    }

    /// Remove a request by id; returns whether it was queued.
    ///
    /// A send already in flight for that entry is not aborted.
    pub fn remove_request(&self, id: &str) -> bool {
        let state = {
            let mut inner = self.lock();
            if inner.queue.remove(id).is_none() {
                return false;
            }
            debug!("Request {} removed", id);
            self.persist(&mut inner);
            publish(&mut inner)
        };
        self.notify(&state);
        true
    }

    /// Drop every queued request and persist the empty queue
    pub fn clear_queue(&self) {
        let state = {
            let mut inner = self.lock();
            let removed = inner.queue.clear();
            info!("Cleared {} queued request(s)", removed);
            self.persist(&mut inner);
            publish(&mut inner)
        };
        self.notify(&state);
    }

    /// Register a state listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&QueueState) + Send + Sync + 'static,
    {
        self.shared.subscribers.subscribe(listener)
    }

    /// Start a drain now if online, idle and non-empty; returns whether one was started
    pub fn force_sync(&self) -> bool {
        if !self.is_online() {
            debug!("force_sync ignored: offline");
            return false;
        }
        if self.is_empty() {
            debug!("force_sync ignored: nothing queued");
            return false;
        }
        if self.is_processing() {
            debug!("force_sync ignored: a send is in flight");
            return false;
        }
        self.spawn_drain()
    }

    // ========== Processing ==========

    /// Run one processing cycle against the head entry.
    ///
    /// Does not consult connectivity; callers decide whether to sync.
    pub async fn process_once(&self) -> CycleReport {
        let (head, state) = {
            let mut inner = self.lock();
            if inner.is_processing {
                return CycleReport::Busy;
            }
            let Some(head) = inner.queue.head().cloned() else {
                return CycleReport::Idle;
            };
            inner.is_processing = true;
            inner.last_sync_attempt = Some(chrono::Utc::now().timestamp_millis());
            inner.metrics.record_cycle_start();
            (head, publish(&mut inner))
        };
        let mut guard = CycleGuard { queue: self, armed: true };
        self.notify(&state);

        debug!(
            "Sending {} {} ({}, attempt {}/{}{})",
            head.method,
            head.url,
            head.id,
            head.retry_count + 1,
            head.max_retries,
            if head.is_last_attempt() { ", last" } else { "" }
        );
        let result = self.shared.transport.send(&head).await;
        let outcome = SendOutcome::classify(&result);

        guard.armed = false;
        let (report, state) = {
            let mut inner = self.lock();
            let report = self.settle(&mut inner, &head.id, outcome);
            inner.is_processing = false;
            (report, publish(&mut inner))
        };
        self.notify(&state);

        report
    }

    /// Run cycles until the queue empties, the client goes offline, or
    /// another cycle holds the queue
    pub async fn drain(&self) {
        loop {
            if matches!(self.process_once().await, CycleReport::Idle | CycleReport::Busy) {
                break;
            }
            if self.is_empty() || !self.is_online() {
                break;
            }
            tokio::time::sleep(self.shared.config.drain_delay).await;
        }
    }

    /// Timer entry point: drain if online, non-empty and idle
    pub async fn sync_if_ready(&self) -> bool {
        if !self.is_online() || self.is_empty() || self.is_processing() {
            return false;
        }
        self.drain().await;
        true
    }

    fn spawn_drain(&self) -> bool {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let queue = self.clone();
                handle.spawn(async move { queue.drain().await });
                true
            }
            Err(_) => {
                debug!("No async runtime; leaving queued requests for the next sync");
                false
            }
        }
    }

    /// Apply a send outcome to the entry with `id`, if it is still queued
    fn settle(&self, inner: &mut Inner, id: &str, outcome: SendOutcome) -> CycleReport {
        let Some(entry) = inner.queue.get_mut(id) else {
            debug!("Request {} left the queue while in flight", id);
            inner.metrics.record_abandoned();
            return CycleReport::Vanished { id: id.to_string() };
        };

        let sent_retry_count = entry.retry_count;
        let decision = retry::apply_outcome(entry, &outcome);
        let retry_count = entry.retry_count;

        let report = match (decision, outcome) {
            (RetryDecision::Remove(RemovalReason::Delivered), SendOutcome::Delivered { status }) => {
                inner.queue.remove(id);
                inner.metrics.record_delivered();
                info!("Request {} delivered (HTTP {})", id, status);
                CycleReport::Delivered {
                    id: id.to_string(),
                    status,
                    retry_count: sent_retry_count,
                }
            }
            (RetryDecision::Remove(RemovalReason::Rejected), SendOutcome::Rejected { status }) => {
                inner.queue.remove(id);
                inner.metrics.record_rejected();
                warn!("Request {} rejected with HTTP {}; dropping", id, status);
                inner.last_error = Some(LastError::new(
                    ErrorKind::Rejected,
                    Some(id),
                    format!("HTTP {}", status),
                ));
                CycleReport::Rejected {
                    id: id.to_string(),
                    status,
                }
            }
            (RetryDecision::Remove(_), SendOutcome::Transient { reason }) => {
                inner.queue.remove(id);
                inner.metrics.record_dropped();
                warn!(
                    "Request {} failed {} time(s), giving up: {}",
                    id, retry_count, reason
                );
                inner.last_error = Some(LastError::new(ErrorKind::Exhausted, Some(id), reason));
                CycleReport::Dropped {
                    id: id.to_string(),
                    retry_count,
                }
            }
            (_, outcome) => {
                let reason = match outcome {
                    SendOutcome::Transient { reason } => reason,
                    other => format!("{:?}", other),
                };
                inner.metrics.record_retry();
                debug!("Request {} will be retried ({}): {}", id, retry_count, reason);
                inner.last_error = Some(LastError::new(ErrorKind::Transient, Some(id), reason));
                CycleReport::Retrying {
                    id: id.to_string(),
                    retry_count,
                }
            }
        };

        self.persist(inner);
        report
    }

    // ========== Read model ==========

    /// Current snapshot
    pub fn state(&self) -> QueueState {
        snapshot(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_processing(&self) -> bool {
        self.lock().is_processing
    }

    pub fn last_sync_attempt(&self) -> Option<i64> {
        self.lock().last_sync_attempt
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.lock().last_error.clone()
    }

    pub fn get(&self, id: &str) -> Option<QueuedRequest> {
        self.lock().queue.get(id).cloned()
    }

    pub fn stats(&self) -> QueueStats {
        self.lock().queue.stats()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.lock().metrics.snapshot()
    }

    pub fn config(&self) -> &QueueConfig {
        &self.shared.config
    }

    pub fn is_online(&self) -> bool {
        self.shared.connectivity.is_online()
    }

    // ========== Internals ==========

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking listener never holds this lock, so a poisoned guard still has consistent data
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, state: &QueueState) {
        self.shared.subscribers.notify(state);
    }

    /// Mirror the queue into storage; failures are logged and recorded only
    fn persist(&self, inner: &mut Inner) {
        let key = &self.shared.config.storage_key;
        let result = serde_json::to_string(&inner.queue.to_vec())
            .map_err(QueueError::from)
            .and_then(|json| self.shared.storage.write(key, &json));

        if let Err(e) = result {
            warn!("Failed to persist offline queue '{}': {}", key, e);
            inner.last_error = Some(LastError::new(ErrorKind::Storage, None, e.to_string()));
        }
    }
}

/// Resets `is_processing` if a cycle future is dropped mid-send
struct CycleGuard<'a> {
    queue: &'a OfflineQueue,
    armed: bool,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let state = {
            let mut inner = self.queue.lock();
            inner.is_processing = false;
            inner.metrics.record_abandoned();
            publish(&mut inner)
        };
        debug!("Processing cycle cancelled mid-send");
        self.queue.notify(&state);
    }
}

fn snapshot(inner: &Inner) -> QueueState {
    QueueState {
        version: inner.version,
        queue: inner.queue.to_vec(),
        is_processing: inner.is_processing,
        last_sync_attempt: inner.last_sync_attempt,
        last_error: inner.last_error.clone(),
    }
}

/// Snapshot for listeners, newer than every one before it
fn publish(inner: &mut Inner) -> QueueState {
    inner.version += 1;
    snapshot(inner)
}

/// Load the persisted queue; missing or corrupt slots yield an empty queue
fn hydrate(storage: &dyn QueueStorage, key: &str) -> (RequestQueue, Option<LastError>) {
    match storage.read(key) {
        Ok(None) => (RequestQueue::new(), None),
        Ok(Some(raw)) => match serde_json::from_str::<Vec<QueuedRequest>>(&raw) {
            Ok(entries) => (RequestQueue::from_entries(entries), None),
            Err(e) => {
                warn!("Discarding corrupt offline queue '{}': {}", key, e);
                let error = LastError::new(ErrorKind::CorruptState, None, e.to_string());
                (RequestQueue::new(), Some(error))
            }
        },
        Err(e) => {
            warn!("Failed to load offline queue '{}': {}", key, e);
            let error = LastError::new(ErrorKind::Storage, None, e.to_string());
            (RequestQueue::new(), Some(error))
        }
    }
}
