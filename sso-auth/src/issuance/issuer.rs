//! Server-to-server API token issuance.
//!
//! Trades a provider access token for a local API token. No redirect, no
//! state token, but the same profile-translation and account-linking path as
//! the browser flow so both produce identical identity semantics.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use super::resolver::ClientIdResolver;
use crate::account::{AccountLink, ApiTokenIssuer, ConnectOptions};
use crate::error::{
    config_error, issuance_error, ConfigErrorKind, Error, ErrorKind, IssuanceErrorKind,
};
use crate::http::HttpTransport;
use crate::oauth::fetch::ProfileFetcher;
use crate::oauth::profile::translate;
use crate::provider::ProviderStore;

/// Fixed lifetime of issued API tokens.
pub const API_TOKEN_TTL_HOURS: i64 = 24;

/// A freshly issued local API token.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues local API tokens after re-validating a provider access token.
pub struct AccessTokenIssuer {
    resolver: ClientIdResolver,
    providers: Arc<dyn ProviderStore>,
    fetcher: ProfileFetcher,
    accounts: Arc<dyn AccountLink>,
    api_tokens: Arc<dyn ApiTokenIssuer>,
}

impl AccessTokenIssuer {
    pub fn new(
        resolver: ClientIdResolver,
        providers: Arc<dyn ProviderStore>,
        transport: Arc<dyn HttpTransport>,
        accounts: Arc<dyn AccountLink>,
        api_tokens: Arc<dyn ApiTokenIssuer>,
    ) -> Self {
        Self {
            resolver,
            providers,
            fetcher: ProfileFetcher::new(transport),
            accounts,
            api_tokens,
        }
    }

    /// Exchange a provider access token for a local API token.
    pub async fn issue(
        &self,
        client_id: &str,
        oauth_access_token: &str,
    ) -> Result<IssuedToken, Error> {
        let provider_key = self.resolver.resolve(client_id).await?;
        let provider = self
            .providers
            .get_by_key(&provider_key)
            .await?
            .ok_or_else(|| {
                config_error(
                    ConfigErrorKind::UnknownProvider,
                    "resolved provider is no longer registered",
                )
            })?;

        // Re-validated against the live configuration even though resolution
        // matched: the config store may have moved the client ID since.
        if provider.client_id != client_id {
            return Err(issuance_error(
                IssuanceErrorKind::ClientMismatch,
                "client id does not match the resolved provider",
            ));
        }
        if !provider.is_configured() {
            return Err(config_error(
                ConfigErrorKind::NotConfigured,
                "provider is missing a client id or secret",
            ));
        }
        if !provider.is_active() {
            return Err(issuance_error(
                IssuanceErrorKind::InactiveProvider,
                "provider is not active",
            ));
        }
        if !provider.allow_access_tokens {
            return Err(issuance_error(
                IssuanceErrorKind::Disallowed,
                "provider does not allow API token issuance",
            ));
        }

        // An invalid OAuth token must read as a caller fault, not a server
        // error.
        let raw_profile = self
            .fetcher
            .fetch(&provider, oauth_access_token)
            .await
            .map_err(|err| {
                warn!(provider = %provider.key, "Profile fetch failed during token issuance");
                Error {
                    source: Some(Box::new(err)),
                    error_kind: ErrorKind::Issuance(IssuanceErrorKind::Forbidden),
                }
            })?;
        let profile = translate(raw_profile, &provider.field_mapping, &provider.key);

        let local_user_id = self
            .accounts
            .connect(
                &profile.unique_id,
                &provider.key,
                &profile,
                ConnectOptions { sync_existing: true },
            )
            .await?;

        let expires_at = Utc::now() + Duration::hours(API_TOKEN_TTL_HOURS);
        let token = self
            .api_tokens
            .issue(&local_user_id, expires_at, "sso access token exchange")
            .await?;

        info!(provider = %provider.key, "Issued API token via access token exchange");

        Ok(IssuedToken { token, expires_at })
    }
}
