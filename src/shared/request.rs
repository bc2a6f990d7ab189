//! Queued Request Data Structures
//!
//! `QueuedRequest` is one buffered mutation as it lives in the queue and in
//! the persisted slot. `NewRequest` is what callers hand to
//! `OfflineQueue::add_request`; the queue fills in id, timestamp and retry
//! count.
//!
//! # Wire format
//!
//! The persisted slot is a JSON array of `QueuedRequest` with camelCase keys:
//!
//! ```json
//! [{"id":"1700000000000-k3j9x0a1b","url":"/api/orders","method":"POST",
//!   "body":{"msisdn":"0241234567","volume":"5GB"},"headers":{},
//!   "timestamp":1700000000000,"retryCount":0,"maxRetries":3,"priority":"high"}]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Request priority. Ordering is `High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Drained last
    Low,
    /// Normal traffic
    #[default]
    Medium,
    /// Drained first (e.g. order placement)
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// HTTP verb used when replaying a request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            other => Err(format!("unsupported method '{}'", other)),
        }
    }
}

/// A buffered request waiting to be replayed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// Unique id, assigned at enqueue time
    pub id: String,
    /// Target URL, absolute or relative to the configured API base
    pub url: String,
    /// HTTP verb
    pub method: HttpMethod,
    /// JSON payload, forwarded as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    /// Extra headers, merged over `Content-Type: application/json`
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Creation time in epoch milliseconds
    pub timestamp: i64,
    /// Failed retryable attempts so far
    pub retry_count: u32,
    /// Eviction threshold for `retry_count`
    pub max_retries: u32,
    /// Insertion priority
    pub priority: Priority,
}

impl QueuedRequest {
    /// Materialize a caller request with a fresh id and timestamp.
    pub(crate) fn from_new(request: NewRequest, default_max_retries: u32) -> Self {
        let timestamp = chrono::Utc::now().timestamp_millis();
        Self {
            id: generate_id(timestamp),
            url: request.url,
            method: request.method,
            body: request.body,
            headers: request.headers,
            timestamp,
            retry_count: 0,
            max_retries: request.max_retries.unwrap_or(default_max_retries),
            priority: request.priority,
        }
    }

    /// Whether another retryable failure would evict this entry
    pub fn is_last_attempt(&self) -> bool {
        self.retry_count.saturating_add(1) >= self.max_retries
    }
}

/// `<epoch-ms>-<9 random chars>`
fn generate_id(timestamp: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", timestamp, &suffix[..9])
}

/// Caller input for `OfflineQueue::add_request`
#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub url: String,
    pub method: HttpMethod,
    pub body: Option<serde_json::Value>,
    pub headers: BTreeMap<String, String>,
    /// `None` falls back to the configured default
    pub max_retries: Option<u32>,
    pub priority: Priority,
}

impl NewRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            headers: BTreeMap::new(),
            max_retries: None,
            priority: Priority::default(),
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    pub fn body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }
}
