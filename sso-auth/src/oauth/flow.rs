//! The browser-facing SSO flow controller.
//!
//! Drives authorize-URI construction, callback handling (exchange, profile
//! fetch, state verification, stash), the post-redirect connect preparation,
//! and the standalone refresh transition. One flow value is built per inbound
//! request; all collaborators arrive at construction and the value is
//! immutable thereafter.

use std::sync::Arc;

use chrono::Duration;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::exchange::TokenExchangeClient;
use super::fetch::ProfileFetcher;
use super::profile::translate;
use super::stash::{StashStore, StashedSession, STASH_TTL_SECONDS};
use super::state::{self, StateBlob, StateTokenService, STATE_TARGET_FIELD, STATE_TOKEN_FIELD};
use crate::error::{
    config_error, exchange_error, flow_error, ConfigErrorKind, Error, ExchangeErrorKind,
    FlowErrorKind,
};
use crate::http::HttpTransport;
use crate::provider::ProviderConfig;

/// Query parameters delivered to the callback endpoint.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

/// Successful callback result, carried forward to the connect step.
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// Opaque stash identifier for the connect handoff.
    pub stash_id: String,
    /// Redirect target the caller placed in the state blob, if any.
    pub target: Option<String>,
}

/// Connect-step handoff for the host's account linker.
///
/// The incoming identity is pre-verified by the flow; the host still applies
/// its own account-creation policy.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConnectData {
    /// Pending-account form state with profile values merged in.
    pub form: Map<String, Value>,
    /// Provider key the token bundle is attached under.
    pub provider_key: String,
    /// Token bundle and canonical profile for later API calls.
    pub session: StashedSession,
    pub verified: bool,
}

/// Result of a refresh exchange.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    /// The refresh token to keep on file: rotated when the provider returned
    /// a different one, otherwise the token that was presented.
    pub refresh_token: String,
    /// True when `refresh_token` differs from the one presented. Hosts
    /// persist the token only in this case.
    pub rotated: bool,
}

/// The per-request flow controller.
pub struct SsoFlow {
    provider: ProviderConfig,
    redirect_uri: String,
    exchange: TokenExchangeClient,
    fetcher: ProfileFetcher,
    state_tokens: Arc<dyn StateTokenService>,
    stash: Arc<dyn StashStore>,
}

impl SsoFlow {
    /// Create a flow for one provider.
    ///
    /// `redirect_uri` is the local callback URL registered with the provider.
    pub fn new(
        provider: ProviderConfig,
        redirect_uri: &str,
        transport: Arc<dyn HttpTransport>,
        state_tokens: Arc<dyn StateTokenService>,
        stash: Arc<dyn StashStore>,
    ) -> Self {
        Self {
            exchange: TokenExchangeClient::new(transport.clone()),
            fetcher: ProfileFetcher::new(transport),
            provider,
            redirect_uri: redirect_uri.to_string(),
            state_tokens,
            stash,
        }
    }

    /// The provider this flow was built for.
    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Build the provider authorize URI to redirect the browser to.
    ///
    /// The caller state blob is extended with a fresh single-use token and
    /// rides along as the `state` parameter.
    pub async fn authorize_url(
        &self,
        caller_state: StateBlob,
        extras: &[(String, String)],
    ) -> Result<String, Error> {
        if !self.provider.is_configured() {
            return Err(config_error(
                ConfigErrorKind::NotConfigured,
                "provider is missing a client id or secret",
            ));
        }

        let mut defaults = vec![
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.provider.client_id.clone()),
            ("redirect_uri".to_string(), self.redirect_uri.clone()),
            ("scope".to_string(), self.provider.scope.clone()),
        ];
        if let Some(prompt) = &self.provider.prompt {
            defaults.push(("prompt".to_string(), prompt.clone()));
        }

        let mut params = super::merge_params(defaults, &[&self.provider.authorize_params, extras]);

        let mut blob = caller_state;
        let token = self.state_tokens.issue(&self.provider.key).await;
        blob.insert(STATE_TOKEN_FIELD.to_string(), Value::String(token));
        params.push(("state".to_string(), state::encode(&blob)));

        let query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        let separator = if self.provider.authorize_url.contains('?') {
            '&'
        } else {
            '?'
        };

        debug!(provider = %self.provider.key, "Issued authorize redirect");
        Ok(format!(
            "{}{}{}",
            self.provider.authorize_url,
            separator,
            query.join("&")
        ))
    }

    /// Handle the provider callback.
    ///
    /// Exchanges the code, fetches and normalizes the profile, verifies the
    /// single-use state token, and stashes the session for the connect step.
    pub async fn handle_callback(&self, params: CallbackParams) -> Result<CallbackOutcome, Error> {
        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            warn!(provider = %self.provider.key, error, "Provider returned error on callback");
            return Err(exchange_error(
                ExchangeErrorKind::Provider,
                &format!("provider returned error: {}", error),
            ));
        }

        let code = match params.code.as_deref().filter(|c| !c.is_empty()) {
            Some(code) => code,
            None => return Err(flow_error(FlowErrorKind::Validation, "missing code")),
        };

        let token_response = self
            .exchange
            .exchange(&self.provider, &self.redirect_uri, code, false, &[])
            .await?;
        if token_response.is_failure() {
            return Err(exchange_error(
                ExchangeErrorKind::Provider,
                &token_response.error_message(),
            ));
        }
        let access_token = token_response.access_token.unwrap_or_default();

        let raw_profile = self.fetcher.fetch(&self.provider, &access_token).await?;
        let profile = translate(raw_profile, &self.provider.field_mapping, &self.provider.key);

        // State is checked only after the exchange completes; nothing is
        // stashed until the nonce has been consumed.
        let blob = state::decode(params.state.as_deref().unwrap_or_default());
        let state_token = blob
            .get(STATE_TOKEN_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if !self
            .state_tokens
            .verify(&self.provider.key, state_token)
            .await
        {
            warn!(
                provider = %self.provider.key,
                "State token verification failed; rejecting callback as a possible replay"
            );
            return Err(flow_error(
                FlowErrorKind::AuthState,
                "invalid or replayed state",
            ));
        }

        let stash_id = self
            .stash
            .put(
                StashedSession {
                    access_token,
                    refresh_token: token_response.refresh_token,
                    profile,
                },
                Duration::seconds(STASH_TTL_SECONDS),
            )
            .await?;

        info!(provider = %self.provider.key, "Callback complete, session stashed");

        Ok(CallbackOutcome {
            stash_id,
            target: blob
                .get(STATE_TARGET_FIELD)
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Prepare the account-connect handoff from a stashed session.
    ///
    /// Profile values are merged into the pending-account form; existing form
    /// values survive only where the profile did not supply one.
    pub async fn prepare_connect(
        &self,
        stash_id: &str,
        pending_form: Map<String, Value>,
    ) -> Result<ConnectData, Error> {
        let session = self
            .stash
            .get_and_keep(stash_id)
            .await?
            .ok_or_else(|| {
                flow_error(
                    FlowErrorKind::MissingSession,
                    "stashed session absent or expired",
                )
            })?;

        let mut form = pending_form;
        if let Ok(Value::Object(profile_fields)) = serde_json::to_value(&session.profile) {
            for (key, value) in profile_fields {
                if value_is_blank(&value) {
                    continue;
                }
                form.insert(key, value);
            }
        }

        Ok(ConnectData {
            form,
            provider_key: self.provider.key.clone(),
            session,
            verified: true,
        })
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// Invoked whenever an access token is needed, none is cached, and a
    /// refresh token is on file. A provider that does not rotate the refresh
    /// token leaves the stored one in place.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshOutcome, Error> {
        if refresh_token.is_empty() {
            return Err(flow_error(FlowErrorKind::Validation, "missing refresh token"));
        }

        let response = self
            .exchange
            .exchange(&self.provider, &self.redirect_uri, refresh_token, true, &[])
            .await?;
        if response.is_failure() {
            return Err(exchange_error(
                ExchangeErrorKind::Provider,
                &response.error_message(),
            ));
        }

        let access_token = response.access_token.unwrap_or_default();
        let rotated = response
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty() && *t != refresh_token);

        Ok(RefreshOutcome {
            access_token,
            rotated: rotated.is_some(),
            refresh_token: rotated.unwrap_or(refresh_token).to_string(),
        })
    }
}

fn value_is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
