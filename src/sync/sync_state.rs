//! # Queue State and Subscribers
//!
//! `QueueState` is the snapshot handed to observers after every mutation.
//! `Subscribers` holds the listener closures.
//!
//! Every snapshot carries a `version` assigned under the queue lock. Delivery
//! is serialized: one caller at a time runs the listeners, and snapshots
//! handed in meanwhile (from other threads, or from a listener mutating the
//! queue) are parked and delivered afterwards, newest only. Listeners
//! therefore see strictly increasing versions and always end on the latest
//! state. They run with no queue lock held and may call public queue methods.

use crate::shared::request::QueuedRequest;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Observable snapshot of the queue
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    /// Increases with every published change
    pub version: u64,
    /// Entries, head first
    pub queue: Vec<QueuedRequest>,
    /// A send is in flight
    pub is_processing: bool,
    /// Start of the most recent processing cycle, epoch milliseconds
    pub last_sync_attempt: Option<i64>,
    /// Most recent failure seen by the queue
    pub last_error: Option<LastError>,
}

impl QueueState {
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Kind of failure recorded in `QueueState::last_error`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Persisted slot could not be read or written
    Storage,
    /// Persisted slot held invalid JSON
    CorruptState,
    /// Server refused the request (non-5xx); entry dropped
    Rejected,
    /// 5xx or transport failure; entry kept for another attempt
    Transient,
    /// Retry ceiling reached; entry dropped
    Exhausted,
}

/// A failure observed by the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub kind: ErrorKind,
    /// Request involved, if any
    pub request_id: Option<String>,
    pub message: String,
    /// Epoch milliseconds
    pub at: i64,
}

impl LastError {
    pub fn new(kind: ErrorKind, request_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            kind,
            request_id: request_id.map(str::to_string),
            message: message.into(),
            at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Listener callback
pub type Listener = Arc<dyn Fn(&QueueState) + Send + Sync>;

type ListenerMap = Mutex<BTreeMap<u64, Listener>>;

#[derive(Debug, Default)]
struct Delivery {
    /// Newest snapshot not yet handed to listeners
    pending: Option<QueueState>,
    /// Some caller is running the listeners
    delivering: bool,
    last_delivered: Option<u64>,
}

impl Delivery {
    fn offer(&mut self, state: &QueueState) {
        if self.last_delivered.is_some_and(|v| state.version <= v) {
            return;
        }
        if self.pending.as_ref().is_some_and(|p| p.version >= state.version) {
            return;
        }
        self.pending = Some(state.clone());
    }
}

/// Registry of state listeners
#[derive(Default)]
pub struct Subscribers {
    next_id: AtomicU64,
    listeners: Arc<ListenerMap>,
    delivery: Mutex<Delivery>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.len())
            .finish()
    }
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&QueueState) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.insert(id, Arc::new(listener));
        }
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Hand `state` to every listener, unless a newer one already went out.
    ///
    /// Returns once nothing is left to deliver, or at once if another caller
    /// is delivering; that caller picks `state` up.
    pub fn notify(&self, state: &QueueState) {
        {
            let mut delivery = self.lock_delivery();
            delivery.offer(state);
            if delivery.delivering {
                return;
            }
            delivery.delivering = true;
        }
        let mut turn = DeliveryTurn {
            subscribers: self,
            finished: false,
        };

        loop {
            let next = {
                let mut delivery = self.lock_delivery();
                match delivery.pending.take() {
                    Some(next) => {
                        delivery.last_delivered = Some(next.version);
                        next
                    }
                    None => {
                        // Same critical section as the check, so no offer is stranded
                        delivery.delivering = false;
                        turn.finished = true;
                        return;
                    }
                }
            };

            // Copy the list out so listeners can (un)subscribe from inside a callback
            let listeners: Vec<Listener> = match self.listeners.lock() {
                Ok(listeners) => listeners.values().cloned().collect(),
                Err(_) => {
                    tracing::error!("Subscriber registry lock poisoned; skipping notification");
                    return;
                }
            };
            for listener in listeners {
                listener(&next);
            }
        }
    }

    fn lock_delivery(&self) -> std::sync::MutexGuard<'_, Delivery> {
        self.delivery
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the delivery turn when a listener panics
struct DeliveryTurn<'a> {
    subscribers: &'a Subscribers,
    finished: bool,
}

impl Drop for DeliveryTurn<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.subscribers.lock_delivery().delivering = false;
        }
    }
}

/// Handle returned by `subscribe`
///
/// Dropping the handle keeps the listener registered; call `unsubscribe`.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<ListenerMap>,
}

impl Subscription {
    /// Deregister the listener
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            if let Ok(mut listeners) = listeners.lock() {
                listeners.remove(&self.id);
            }
        }
    }
}
