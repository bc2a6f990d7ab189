//! # Network Monitor
//!
//! Online/offline signal consumed by the queue. The queue never detects
//! connectivity itself; it reads this flag at decision points (enqueue,
//! `force_sync`, each timer tick). Whatever owns real connectivity detection
//! flips the flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Online,
    Offline,
}

/// Synchronous connectivity query
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Manually driven connectivity flag, cheap to clone and share
#[derive(Debug, Clone)]
pub struct NetworkMonitor {
    online: Arc<AtomicBool>,
}

impl NetworkMonitor {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn online() -> Self {
        Self::new(true)
    }

    pub fn offline() -> Self {
        Self::new(false)
    }

    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            tracing::info!("Network status changed: {:?}", self.status());
        }
    }

    pub fn status(&self) -> NetworkStatus {
        if self.is_online() {
            NetworkStatus::Online
        } else {
            NetworkStatus::Offline
        }
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::online()
    }
}

impl Connectivity for NetworkMonitor {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
