//! Transport doubles for integration tests
//!
//! - `ScriptedTransport`: answers from a fixed list of statuses
//! - `GatedTransport`: holds every send until the test releases it

use async_trait::async_trait;
use offline_queue::offline::{Transport, TransportResponse};
use offline_queue::{QueueError, QueuedRequest};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Replays scripted statuses in order; a transport error once the script runs out
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<u16>>,
    calls: AtomicUsize,
    sent: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new(statuses: &[u16]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(statuses.iter().copied().collect()),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs in the order they were sent
    pub fn sent_urls(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &QueuedRequest) -> Result<TransportResponse, QueueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(request.url.clone());
        match self.script.lock().unwrap().pop_front() {
            Some(status) => Ok(TransportResponse::new(status)),
            None => Err(QueueError::transport("connection refused")),
        }
    }
}

/// Blocks each send until `release` is called, then answers with `status`
pub struct GatedTransport {
    gate: Semaphore,
    status: u16,
    calls: AtomicUsize,
}

impl GatedTransport {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
            status,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(&self, _request: &QueuedRequest) -> Result<TransportResponse, QueueError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|e| QueueError::transport(e.to_string()))?;
        permit.forget();
        Ok(TransportResponse::new(self.status))
    }
}
