//! Queue Error Types
//!
//! This module defines the errors produced by the queue's collaborators:
//! the storage slot, the JSON codec and the HTTP transport.
//!
//! # Error Categories
//!
//! - `Storage` - reading or writing the persisted slot failed
//! - `Serialization` - JSON encoding/decoding failed
//! - `Transport` - the request never reached the server
//! - `InvalidRequest` - a request could not be turned into an HTTP call
//!
//! # Usage
//!
//! ```rust
//! use offline_queue::shared::error::QueueError;
//!
//! let error = QueueError::storage("offline-queue", "disk full");
//! assert!(error.to_string().contains("offline-queue"));
//! ```
//!
//! None of these cross the public surface of `OfflineQueue`; the manager logs
//! them and records the latest one in `QueueState::last_error`.
use thiserror::Error;

/// Errors raised by storage, serialization and transport
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Persisted slot could not be read or written
    #[error("Storage error for key '{key}': {message}")]
    Storage {
        /// Storage key of the slot
        key: String,
        /// Human-readable error message
        message: String,
    },

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Human-readable error message
        message: String,
    },

    /// Network or transport failure before a response was received
    #[error("Transport error: {message}")]
    Transport {
        /// Human-readable error message
        message: String,
    },

    /// Request could not be built (bad URL, bad header)
    #[error("Invalid request '{url}': {message}")]
    InvalidRequest {
        /// Target URL as queued
        url: String,
        /// Human-readable error message
        message: String,
    },
}

impl QueueError {
    /// Create a new storage error
    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new invalid request error
    pub fn invalid_request(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            url: url.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for QueueError {
    fn from(err: std::io::Error) -> Self {
        Self::storage("<io>", err.to_string())
    }
}

impl From<reqwest::Error> for QueueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            let url = err.url().map(|u| u.to_string()).unwrap_or_default();
            Self::invalid_request(url, err.to_string())
        } else {
            Self::transport(err.to_string())
        }
    }
}
