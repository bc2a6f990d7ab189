//! Offline Queue - Main Library
//!
//! A persisted queue for outgoing HTTP mutations. Requests made while the
//! client is offline are buffered, mirrored into durable storage, and
//! replayed in priority order once connectivity returns, with a bounded
//! number of retries per request.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by every layer
//!   - Request model persisted and replayed by the queue
//!   - Configuration (`QueueConfig`, environment loading)
//!   - Error types
//!
//! - **`offline`** - The queue manager and its collaborators
//!   - `OfflineQueue`: enqueue, remove, clear, subscribe, force sync
//!   - Priority-bucketed FIFO container
//!   - Storage slots (file, memory) and the reqwest transport
//!   - Retry classification
//!
//! - **`sync`** - Background driving and observation
//!   - `SyncWorker` periodic timer
//!   - Connectivity flag
//!   - Observable state, subscribers and metrics
//!
//! # Feature Flags
//!
//! - **`cli`** - builds the `offline-queue` operator binary (clap, tracing-subscriber)
//!
//! # Usage
//!
//! ```rust,no_run
//! use offline_queue::offline::OfflineQueue;
//! use offline_queue::shared::{NewRequest, Priority, QueueConfig};
//! use offline_queue::sync::{NetworkMonitor, SyncWorker};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let monitor = NetworkMonitor::online();
//! let queue = OfflineQueue::from_config(QueueConfig::from_env()?, monitor.clone())?;
//!
//! let _subscription = queue.subscribe(|state| {
//!     println!("{} pending, processing: {}", state.queue.len(), state.is_processing);
//! });
//!
//! queue.add_request(NewRequest::post("/api/commissions/withdraw").priority(Priority::High));
//!
//! let mut worker = SyncWorker::new(queue.clone());
//! worker.start()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! `OfflineQueue` is `Clone + Send + Sync`. Its state sits behind a mutex that
//! is never held across an `.await` or while listeners run.
//!
//! # Error Handling
//!
//! Queue operations do not return errors. Storage and delivery failures are
//! logged through `tracing` and the latest one is exposed as
//! `QueueState::last_error`. Constructors and configuration return
//! `Result` with `shared::error::QueueError` / `shared::config::ConfigError`.

/// Shared types and data structures
pub mod shared;

/// Queue manager, storage, transport and retry policy
pub mod offline;

/// Background sync, connectivity and observable state
pub mod sync;

pub use offline::{CycleReport, OfflineQueue};
pub use shared::{HttpMethod, NewRequest, Priority, QueueConfig, QueueError, QueuedRequest};
pub use sync::{NetworkMonitor, QueueState, SyncWorker};
