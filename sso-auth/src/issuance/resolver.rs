//! Client-ID to provider resolution.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use super::cache::Cache;
use crate::error::{issuance_error, Error, IssuanceErrorKind};
use crate::provider::ProviderStore;

/// TTL for cached client-ID → provider-key mappings.
pub const CLIENT_ID_CACHE_TTL_SECONDS: i64 = 300;

const CACHE_PREFIX: &str = "sso.client_id.";

/// Resolves an OAuth client ID to the key of the provider that owns it.
pub struct ClientIdResolver {
    providers: Arc<dyn ProviderStore>,
    cache: Arc<dyn Cache>,
}

impl ClientIdResolver {
    pub fn new(providers: Arc<dyn ProviderStore>, cache: Arc<dyn Cache>) -> Self {
        Self { providers, cache }
    }

    /// Resolve the owning provider key for a client ID.
    ///
    /// The cache only accelerates the lookup; a cached provider key is
    /// re-checked against the live configuration, so a stale entry falls back
    /// to the full scan instead of producing a wrong match.
    pub async fn resolve(&self, client_id: &str) -> Result<String, Error> {
        if client_id.is_empty() {
            return Err(issuance_error(
                IssuanceErrorKind::NotFound,
                "empty client id",
            ));
        }

        let cache_key = format!("{}{}", CACHE_PREFIX, client_id);
        if let Some(provider_key) = self.cache.get(&cache_key).await {
            if let Some(provider) = self.providers.get_by_key(&provider_key).await? {
                if provider.client_id == client_id {
                    return Ok(provider.key);
                }
            }
            debug!(client_id, "Stale client-id cache entry, rescanning");
        }

        for provider in self.providers.all().await? {
            if provider.client_id == client_id {
                self.cache
                    .store(
                        &cache_key,
                        &provider.key,
                        Duration::seconds(CLIENT_ID_CACHE_TTL_SECONDS),
                    )
                    .await;
                return Ok(provider.key);
            }
        }

        // A miss is not cached: the next lookup must see newly registered
        // providers.
        Err(issuance_error(
            IssuanceErrorKind::NotFound,
            "no provider registered for client id",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::issuance::cache::InMemoryCache;
    use crate::provider::{ProviderConfig, ProviderRegistry};
    use secrecy::SecretString;

    fn provider(key: &str, client_id: &str) -> ProviderConfig {
        ProviderConfig::new(
            key,
            "https://id.test/authorize",
            "https://id.test/token",
            "https://id.test/profile",
            client_id,
            SecretString::from("secret".to_string()),
        )
    }

    fn resolver(providers: Vec<ProviderConfig>) -> (ClientIdResolver, Arc<InMemoryCache>) {
        let cache = Arc::new(InMemoryCache::new());
        let resolver = ClientIdResolver::new(
            Arc::new(ProviderRegistry::new(providers)),
            cache.clone(),
        );
        (resolver, cache)
    }

    #[tokio::test]
    async fn test_resolves_and_caches() {
        let (resolver, cache) = resolver(vec![
            provider("acme", "client-a"),
            provider("umbrella", "client-u"),
        ]);

        assert_eq!(resolver.resolve("client-u").await.unwrap(), "umbrella");
        assert_eq!(
            cache.get("sso.client_id.client-u").await.as_deref(),
            Some("umbrella")
        );

        // Second resolve is served from the cache.
        assert_eq!(resolver.resolve("client-u").await.unwrap(), "umbrella");
    }

    #[tokio::test]
    async fn test_unknown_client_id_not_found_and_not_cached() {
        let (resolver, cache) = resolver(vec![provider("acme", "client-a")]);

        let err = resolver.resolve("client-x").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Issuance(IssuanceErrorKind::NotFound)
        );
        assert!(cache.get("sso.client_id.client-x").await.is_none());
    }

    #[tokio::test]
    async fn test_stale_cache_entry_falls_back_to_scan() {
        let (resolver, cache) = resolver(vec![
            provider("acme", "client-a"),
            provider("umbrella", "client-u"),
        ]);

        // Poison the cache: the client ID points at a provider whose
        // configuration no longer carries it.
        cache
            .store("sso.client_id.client-u", "acme", Duration::minutes(5))
            .await;

        assert_eq!(resolver.resolve("client-u").await.unwrap(), "umbrella");
    }

    #[tokio::test]
    async fn test_empty_client_id_not_found() {
        let (resolver, _) = resolver(vec![provider("acme", "client-a")]);
        let err = resolver.resolve("").await.unwrap_err();
        assert_eq!(
            err.error_kind,
            ErrorKind::Issuance(IssuanceErrorKind::NotFound)
        );
    }
}
