//! HTTP transport boundary.
//!
//! The flow engine depends only on the [`HttpTransport`] shape; the default
//! reqwest-backed implementation lives in [`client`]. Retry/backoff policy is
//! the transport's concern, never the engine's.

pub mod client;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;

pub use client::{ReqwestTransport, TransportBuilder};

/// HTTP method for an outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Encoding used for POST parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    FormUrlEncoded,
    Json,
}

/// A single outbound HTTP call.
///
/// For GET requests `params` become the query string; for POST requests they
/// become the body, encoded according to `body_format`.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body_format: BodyFormat,
    pub timeout: Duration,
}

impl TransportRequest {
    /// Create a GET request with the given query parameters.
    pub fn get(url: &str, params: Vec<(String, String)>) -> Self {
        Self {
            url: url.to_string(),
            method: Method::Get,
            params,
            headers: Vec::new(),
            body_format: BodyFormat::FormUrlEncoded,
            timeout: Duration::from_secs(10),
        }
    }

    /// Create a POST request with the given body parameters.
    pub fn post(url: &str, params: Vec<(String, String)>, body_format: BodyFormat) -> Self {
        Self {
            url: url.to_string(),
            method: Method::Post,
            params,
            headers: Vec::new(),
            body_format,
            timeout: Duration::from_secs(10),
        }
    }

    /// Add a request header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The response shape the engine consumes.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
}

impl TransportResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True when the response declares a JSON content type.
    pub fn is_json(&self) -> bool {
        self.content_type
            .to_ascii_lowercase()
            .contains("application/json")
    }
}

/// Trait for dispatching outbound HTTP calls.
///
/// The engine performs no retries itself; implementations own retry/backoff.
/// A timeout must surface as a transport-kind error, failing the flow rather
/// than blocking it.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Perform the call and return the raw response.
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, Error>;
}
