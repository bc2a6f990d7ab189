//! # Retry Classification
//!
//! Decides what happens to the head entry after one send attempt. There is
//! no backoff: a retryable failure leaves the entry at the head for the next
//! cycle until its `retry_count` reaches `max_retries`.
//!
//! | Send result            | Decision                                  |
//! |------------------------|-------------------------------------------|
//! | 2xx                    | `Remove(Delivered)`                       |
//! | 5xx                    | `Retry`, or `Remove(Exhausted)` at ceiling |
//! | any other status       | `Remove(Rejected)`, retry count untouched |
//! | transport error        | same as 5xx                               |

use crate::offline::transport::TransportResponse;
use crate::shared::error::QueueError;
use crate::shared::request::QueuedRequest;

/// Classified result of one send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// 2xx response
    Delivered { status: u16 },
    /// Non-2xx, non-5xx response; retrying cannot help
    Rejected { status: u16 },
    /// 5xx response or transport failure
    Transient { reason: String },
}

impl SendOutcome {
    /// Classify a transport result
    pub fn classify(result: &Result<TransportResponse, QueueError>) -> Self {
        match result {
            Ok(response) if response.is_success() => SendOutcome::Delivered {
                status: response.status,
            },
            Ok(response) if response.is_server_error() => SendOutcome::Transient {
                reason: format!("HTTP {}", response.status),
            },
            Ok(response) => SendOutcome::Rejected {
                status: response.status,
            },
            Err(e) => SendOutcome::Transient {
                reason: e.to_string(),
            },
        }
    }
}

/// Why an entry left the queue after a send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    Delivered,
    Rejected,
    Exhausted,
}

/// What to do with the entry that was sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Drop the entry from the queue
    Remove(RemovalReason),
    /// Keep the entry at its position for another cycle
    Retry,
}

/// Apply an outcome to the entry, bumping `retry_count` on transient failures
pub fn apply_outcome(request: &mut QueuedRequest, outcome: &SendOutcome) -> RetryDecision {
    match outcome {
        SendOutcome::Delivered { .. } => RetryDecision::Remove(RemovalReason::Delivered),
        SendOutcome::Rejected { .. } => RetryDecision::Remove(RemovalReason::Rejected),
        SendOutcome::Transient { .. } => {
            request.retry_count = request.retry_count.saturating_add(1);
            if request.retry_count >= request.max_retries {
                RetryDecision::Remove(RemovalReason::Exhausted)
            } else {
                RetryDecision::Retry
            }
        }
    }
}
