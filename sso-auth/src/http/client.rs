//! Default reqwest-backed transport with retry middleware.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tracing::debug;

use super::{BodyFormat, HttpTransport, Method, TransportRequest, TransportResponse};
use crate::error::{exchange_error, Error, ErrorKind, ExchangeErrorKind};

/// Builder for the default transport.
///
/// Transient failures are retried with exponential backoff inside the
/// transport; callers above this layer see a single bounded call.
pub struct TransportBuilder {
    timeout: Duration,
    max_retries: u32,
    user_agent: String,
}

impl TransportBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            user_agent: format!("sso-auth/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the client-wide request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries for transient failures.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the user agent string.
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build the configured transport.
    pub fn build(self) -> Result<ReqwestTransport, Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .build()?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(self.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(ReqwestTransport { client })
    }
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The default [`HttpTransport`] implementation.
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
}

impl ReqwestTransport {
    /// Create a transport with default settings.
    pub fn new() -> Result<Self, Error> {
        TransportBuilder::new().build()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, Error> {
        debug!("Dispatching {:?} {}", request.method, request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url).query(&request.params),
            Method::Post => match request.body_format {
                BodyFormat::FormUrlEncoded => self.client.post(&request.url).form(&request.params),
                BodyFormat::Json => {
                    let body: serde_json::Map<String, serde_json::Value> = request
                        .params
                        .iter()
                        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                        .collect();
                    self.client.post(&request.url).json(&body)
                }
            },
        };

        for (name, value) in &request.headers {
            let mut header_value = HeaderValue::from_str(value).map_err(|e| Error {
                source: Some(Box::new(e)),
                error_kind: ErrorKind::Exchange(ExchangeErrorKind::Transport),
            })?;
            if name.eq_ignore_ascii_case("authorization") {
                header_value.set_sensitive(true);
            }
            builder = builder.header(name.as_str(), header_value);
        }

        let response = builder.timeout(request.timeout).send().await?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response
            .text()
            .await
            .map_err(|e| exchange_error(ExchangeErrorKind::Transport, &e.to_string()))?;

        Ok(TransportResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let builder = TransportBuilder::new();
        assert_eq!(builder.timeout, Duration::from_secs(10));
        assert_eq!(builder.max_retries, 3);
    }

    #[test]
    fn test_build_transport() {
        let transport = TransportBuilder::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_retries(0)
            .build();
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_get_sends_query_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/profile")
            .match_query(mockito::Matcher::UrlEncoded(
                "access_token".into(),
                "abc".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let request = TransportRequest::get(
            &format!("{}/profile", server.url()),
            vec![("access_token".to_string(), "abc".to_string())],
        );

        let response = transport.request(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_json());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(mockito::Matcher::UrlEncoded(
                "grant_type".into(),
                "authorization_code".into(),
            ))
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let request = TransportRequest::post(
            &format!("{}/token", server.url()),
            vec![("grant_type".to_string(), "authorization_code".to_string())],
            BodyFormat::FormUrlEncoded,
        );

        let response = transport.request(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let transport = ReqwestTransport::new().unwrap();
        let request = TransportRequest::get("http://127.0.0.1:1/none", vec![]);

        let err = transport.request(request).await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Exchange(ExchangeErrorKind::Transport)
        );
    }
}
