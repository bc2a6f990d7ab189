//! # Request Queue
//!
//! Ordered container for buffered requests. Entries are bucketed by priority
//! and FIFO within a bucket: a new entry goes in front of the first entry with
//! a strictly lower priority, or at the back if there is none. Entries are
//! never re-sorted after insertion.
//!
//! The container is plain data; `OfflineQueue` owns it behind its lock and
//! handles persistence and notification.
//!
//! ## Usage
//!
//! ```rust
//! use offline_queue::offline::queue::RequestQueue;
//!
//! let queue = RequestQueue::new();
//! assert!(queue.head().is_none());
//! ```

use crate::shared::request::{Priority, QueuedRequest};
use std::collections::VecDeque;

/// Priority-bucketed FIFO of queued requests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestQueue {
    /// Queued requests, head first
    entries: VecDeque<QueuedRequest>,
}

impl RequestQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Rebuild a queue from persisted entries, keeping their order
    pub fn from_entries(entries: Vec<QueuedRequest>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    /// Insert a request at its priority position and return that position
    pub fn insert(&mut self, request: QueuedRequest) -> usize {
        let insert_pos = self
            .entries
            .iter()
            .position(|entry| entry.priority < request.priority)
            .unwrap_or(self.entries.len());

        self.entries.insert(insert_pos, request);
        insert_pos
    }

    /// The entry the next processing cycle will send
    pub fn head(&self) -> Option<&QueuedRequest> {
        self.entries.front()
    }

    /// Look up an entry by id
    pub fn get(&self, id: &str) -> Option<&QueuedRequest> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Mutable lookup by id
    pub fn get_mut(&mut self, id: &str) -> Option<&mut QueuedRequest> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    /// Remove an entry by id
    pub fn remove(&mut self, id: &str) -> Option<QueuedRequest> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        self.entries.remove(index)
    }

    /// Drop every entry, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedRequest> {
        self.entries.iter()
    }

    /// Snapshot of the entries, head first
    pub fn to_vec(&self) -> Vec<QueuedRequest> {
        self.entries.iter().cloned().collect()
    }

    /// Count entries per priority
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats {
            total: self.entries.len(),
            ..QueueStats::default()
        };

        for entry in &self.entries {
            match entry.priority {
                Priority::High => stats.high += 1,
                Priority::Medium => stats.medium += 1,
                Priority::Low => stats.low += 1,
            }
            if entry.retry_count > 0 {
                stats.retrying += 1;
            }
        }

        stats
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Total entries
    pub total: usize,
    /// High priority entries
    pub high: usize,
    /// Medium priority entries
    pub medium: usize,
    /// Low priority entries
    pub low: usize,
    /// Entries that have failed at least once
    pub retrying: usize,
}
