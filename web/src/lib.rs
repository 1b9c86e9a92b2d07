//! HTTP edge for the SSO flow engine.
//!
//! Thin axum layer over `sso-auth`: the authorize redirect, the provider
//! callback, the account-connect handoff, and the API token issuance
//! endpoint. All domain semantics live in the engine; this crate only maps
//! wire input and error kinds.

use std::sync::Arc;
use std::time::Duration;

use service::config::Config;
use sso_auth::account::{AccountLink, ApiTokenIssuer};
use sso_auth::error::{config_error, ConfigErrorKind};
use sso_auth::http::{HttpTransport, TransportBuilder};
use sso_auth::issuance::{AccessTokenIssuer, Cache, ClientIdResolver};
use sso_auth::oauth::{SsoFlow, StashStore, StateTokenService};
use sso_auth::provider::ProviderStore;

pub mod controller;
pub mod error;
pub mod router;

pub use error::{Error, Result};

/// Shared application state handed to every controller.
///
/// Collaborators are injected once at startup; a fresh [`SsoFlow`] is built
/// per inbound request from the provider configuration it names.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub providers: Arc<dyn ProviderStore>,
    pub transport: Arc<dyn HttpTransport>,
    pub state_tokens: Arc<dyn StateTokenService>,
    pub stash: Arc<dyn StashStore>,
    pub cache: Arc<dyn Cache>,
    pub accounts: Arc<dyn AccountLink>,
    pub api_tokens: Arc<dyn ApiTokenIssuer>,
}

impl AppState {
    /// Build the default HTTP transport from service configuration.
    pub fn build_transport(config: &Config) -> Result<Arc<dyn HttpTransport>> {
        let transport = TransportBuilder::new()
            .with_timeout(Duration::from_secs(config.http_timeout_secs))
            .with_max_retries(config.http_max_retries)
            .build()?;
        Ok(Arc::new(transport))
    }

    /// Build a flow instance for one provider.
    pub async fn flow_for(&self, provider_key: &str) -> Result<SsoFlow> {
        let provider = self
            .providers
            .get_by_key(provider_key)
            .await?
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::UnknownProvider,
                    "no provider registered under this key",
                )
            })?;

        let redirect_uri = format!(
            "{}/oauth/{}/callback",
            self.config.public_base_url(),
            provider_key
        );

        Ok(SsoFlow::new(
            provider,
            &redirect_uri,
            self.transport.clone(),
            self.state_tokens.clone(),
            self.stash.clone(),
        ))
    }

    /// Build the API token issuance pipeline.
    pub fn token_issuer(&self) -> AccessTokenIssuer {
        AccessTokenIssuer::new(
            ClientIdResolver::new(self.providers.clone(), self.cache.clone()),
            self.providers.clone(),
            self.transport.clone(),
            self.accounts.clone(),
            self.api_tokens.clone(),
        )
    }
}
