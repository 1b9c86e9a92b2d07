//! Profile endpoint retrieval.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use super::merge_params;
use crate::error::{exchange_error, Error, ExchangeErrorKind};
use crate::http::{HttpTransport, TransportRequest, TransportResponse};
use crate::provider::ProviderConfig;

/// Client for the provider's profile endpoint.
pub struct ProfileFetcher {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl ProfileFetcher {
    /// Create a fetcher with the default 10 second timeout.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the profile endpoint timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the raw profile payload with the given access token.
    ///
    /// The token travels as an `Authorization: Bearer` header when the
    /// provider is marked `bearer_token`, as an `access_token` query
    /// parameter otherwise. Never both.
    pub async fn fetch(
        &self,
        provider: &ProviderConfig,
        access_token: &str,
    ) -> Result<Map<String, Value>, Error> {
        let defaults = if provider.bearer_token {
            Vec::new()
        } else {
            vec![("access_token".to_string(), access_token.to_string())]
        };
        let params = merge_params(defaults, &[&provider.profile_params]);

        debug!(provider = %provider.key, "Fetching provider profile");

        let mut request =
            TransportRequest::get(&provider.profile_url, params).with_timeout(self.timeout);
        if provider.bearer_token {
            request = request.with_header("Authorization", &format!("Bearer {}", access_token));
        }

        let response = self.transport.request(request).await?;
        parse_profile_response(&response)
    }
}

fn parse_profile_response(response: &TransportResponse) -> Result<Map<String, Value>, Error> {
    if !response.is_success() {
        let parsed = serde_json::from_str::<Value>(&response.body).ok();
        let provider_error = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .map(|e| match e {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        return match provider_error {
            Some(message) => Err(exchange_error(ExchangeErrorKind::Provider, &message)),
            None => Err(exchange_error(
                ExchangeErrorKind::Server,
                &format!("HTTP error {}", response.status),
            )),
        };
    }

    match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(map)) => Ok(map),
        _ => Err(exchange_error(
            ExchangeErrorKind::Server,
            "profile endpoint returned a non-object payload",
        )),
    }
}
