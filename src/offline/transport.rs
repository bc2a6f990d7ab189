//! # Request Transport
//!
//! Sends one queued request and reports the HTTP status. Status
//! interpretation lives in `retry`; the transport only distinguishes "got a
//! response" from "never reached the server".
//!
//! `ReqwestTransport` always sends `Content-Type: application/json`, then the
//! request's own headers on top (a caller header with the same name, in any
//! case, replaces the default).

use crate::shared::config::QueueConfig;
use crate::shared::error::QueueError;
use crate::shared::request::{HttpMethod, QueuedRequest};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, Url};

/// Response summary returned by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
}

impl TransportResponse {
    pub fn new(status: u16) -> Self {
        Self { status }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 5xx
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Sends queued requests over the network
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &QueuedRequest) -> Result<TransportResponse, QueueError>;
}

/// HTTP transport built on reqwest
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Option<Url>,
}

impl ReqwestTransport {
    /// Build a transport from queue configuration
    pub fn new(config: &QueueConfig) -> Result<Self, QueueError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let base_url = match &config.api_base_url {
            Some(url) => Some(
                Url::parse(url).map_err(|e| QueueError::invalid_request(url, e.to_string()))?,
            ),
            None => None,
        };

        Ok(Self { client, base_url })
    }

    /// Use an existing client
    pub fn with_client(client: Client, base_url: Option<Url>) -> Self {
        Self { client, base_url }
    }

    /// Resolve a queued URL, joining relative paths onto the base URL
    pub fn resolve_url(&self, url: &str) -> Result<Url, QueueError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }
        match &self.base_url {
            Some(base) => base
                .join(url)
                .map_err(|e| QueueError::invalid_request(url, e.to_string())),
            None => Err(QueueError::invalid_request(
                url,
                "relative URL and no API base URL configured",
            )),
        }
    }

    /// Default JSON content type overlaid with the request's headers
    pub fn build_headers(request: &QueuedRequest) -> Result<HeaderMap, QueueError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| QueueError::invalid_request(&request.url, e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| QueueError::invalid_request(&request.url, e.to_string()))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &QueuedRequest) -> Result<TransportResponse, QueueError> {
        let url = self.resolve_url(&request.url)?;
        let headers = Self::build_headers(request)?;

        let mut builder = self
            .client
            .request(to_method(request.method), url)
            .headers(headers);

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_string(body)?);
        }

        let response = builder.send().await?;
        Ok(TransportResponse::new(response.status().as_u16()))
    }
}
