//! Shared Module
//!
//! Types used across the queue, its collaborators and the CLI: the request
//! model that is persisted and replayed, configuration, and error types.

/// Queued request data structures
pub mod request;

/// Shared error types
pub mod error;

/// Queue configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{ConfigError, QueueConfig, QueueConfigBuilder};
pub use error::QueueError;
pub use request::{HttpMethod, NewRequest, Priority, QueuedRequest};
