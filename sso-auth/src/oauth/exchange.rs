//! Token endpoint exchanges.
//!
//! Trades an authorization code or a refresh token for an access token at the
//! provider's token endpoint, with the body layout and error classification
//! providers actually exhibit in the wild.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::merge_params;
use crate::error::{exchange_error, Error, ExchangeErrorKind};
use crate::http::{HttpTransport, TransportRequest, TransportResponse};
use crate::provider::ProviderConfig;

/// Result of a token exchange, straight from the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl AccessTokenResponse {
    /// A response fails when it carries an `error` OR lacks an access token;
    /// either condition alone is sufficient.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || self.access_token.as_deref().map_or(true, str::is_empty)
    }

    /// Provider-supplied failure message, preferring `error`/`error_description`.
    pub fn error_message(&self) -> String {
        match (&self.error, &self.error_description) {
            (Some(error), Some(description)) => format!("{}: {}", error, description),
            (Some(error), None) => error.clone(),
            (None, _) => "missing access token".to_string(),
        }
    }
}

/// Client for the provider's token endpoint.
pub struct TokenExchangeClient {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl TokenExchangeClient {
    /// Create a client with the default 10 second timeout.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the token endpoint timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Exchange an authorization code (or, in refresh mode, a refresh token)
    /// for an access token.
    ///
    /// Caller extras override the computed defaults key-by-key; entries with
    /// empty values are dropped before transmission.
    pub async fn exchange(
        &self,
        provider: &ProviderConfig,
        redirect_uri: &str,
        grant_value: &str,
        is_refresh: bool,
        extras: &[(String, String)],
    ) -> Result<AccessTokenResponse, Error> {
        let defaults = if is_refresh {
            vec![
                ("refresh_token".to_string(), grant_value.to_string()),
                ("grant_type".to_string(), "refresh_token".to_string()),
            ]
        } else {
            vec![
                ("code".to_string(), grant_value.to_string()),
                ("client_id".to_string(), provider.client_id.clone()),
                ("redirect_uri".to_string(), redirect_uri.to_string()),
                (
                    "client_secret".to_string(),
                    provider.client_secret.expose_secret().to_string(),
                ),
                (
                    "grant_type".to_string(),
                    "authorization_code".to_string(),
                ),
                ("scope".to_string(), provider.scope.clone()),
            ]
        };

        let params = merge_params(defaults, &[&provider.token_params, extras]);

        debug!(
            provider = %provider.key,
            refresh = is_refresh,
            "Requesting access token"
        );

        let request =
            TransportRequest::post(&provider.token_url, params, provider.token_body_format)
                .with_timeout(self.timeout);
        let response = self.transport.request(request).await?;

        parse_token_response(&response)
    }
}

/// Interpret a token endpoint response.
///
/// Non-2xx is always an error regardless of body shape; a provider-supplied
/// error pair beats a generic HTTP error message.
fn parse_token_response(response: &TransportResponse) -> Result<AccessTokenResponse, Error> {
    let parsed = if response.is_json() {
        serde_json::from_str::<AccessTokenResponse>(&response.body).ok()
    } else {
        Some(parse_form_response(&response.body))
    };

    if !response.is_success() {
        if let Some(body) = &parsed {
            if body.error.is_some() {
                return Err(exchange_error(
                    ExchangeErrorKind::Provider,
                    &body.error_message(),
                ));
            }
        }
        return Err(exchange_error(
            ExchangeErrorKind::Server,
            &format!("HTTP error {}", response.status),
        ));
    }

    parsed.ok_or_else(|| {
        exchange_error(
            ExchangeErrorKind::Server,
            "token endpoint returned unparseable JSON",
        )
    })
}

/// Parse a form-urlencoded token response body (the legacy non-JSON variant
/// some providers still emit).
fn parse_form_response(body: &str) -> AccessTokenResponse {
    let mut response = AccessTokenResponse::default();
    for pair in body.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = urlencoding::decode(value)
            .map(|v| v.into_owned())
            .unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        match key {
            "access_token" => response.access_token = Some(value),
            "refresh_token" => response.refresh_token = Some(value),
            "error" => response.error = Some(value),
            "error_description" => response.error_description = Some(value),
            _ => {}
        }
    }
    response
}
