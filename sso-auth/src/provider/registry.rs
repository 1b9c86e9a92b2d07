//! Provider lookup.
//!
//! [`ProviderStore`] is the config-store collaborator boundary.
//! [`ProviderRegistry`] is the default implementation: an explicit mapping
//! from provider key to configuration, built at startup/config-load time and
//! queried by key. No ambient global container lookup.

use std::collections::HashMap;

use async_trait::async_trait;

use super::ProviderConfig;
use crate::error::Error;

/// Config-store collaborator: resolves provider configurations.
#[async_trait]
pub trait ProviderStore: Send + Sync {
    /// Look up one provider by its unique key.
    async fn get_by_key(&self, key: &str) -> Result<Option<ProviderConfig>, Error>;

    /// All registered providers.
    async fn all(&self) -> Result<Vec<ProviderConfig>, Error>;
}

/// In-memory provider registry built once from configuration.
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    /// Build a registry from a list of provider configurations.
    ///
    /// Later entries with a duplicate key replace earlier ones.
    pub fn new(providers: Vec<ProviderConfig>) -> Self {
        let providers = providers
            .into_iter()
            .map(|p| (p.key.clone(), p))
            .collect();
        Self { providers }
    }

    /// The provider marked as default, if any.
    pub fn default_provider(&self) -> Option<&ProviderConfig> {
        self.providers.values().find(|p| p.is_default)
    }
}

#[async_trait]
impl ProviderStore for ProviderRegistry {
    async fn get_by_key(&self, key: &str) -> Result<Option<ProviderConfig>, Error> {
        Ok(self.providers.get(key).cloned())
    }

    async fn all(&self) -> Result<Vec<ProviderConfig>, Error> {
        Ok(self.providers.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn provider(key: &str) -> ProviderConfig {
        ProviderConfig::new(
            key,
            "https://id.test/authorize",
            "https://id.test/token",
            "https://id.test/profile",
            &format!("client-{key}"),
            SecretString::from("secret".to_string()),
        )
    }

    #[tokio::test]
    async fn test_get_by_key() {
        let registry = ProviderRegistry::new(vec![provider("a"), provider("b")]);

        let found = registry.get_by_key("a").await.unwrap();
        assert_eq!(found.unwrap().key, "a");

        let missing = registry.get_by_key("c").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_all_lists_every_provider() {
        let registry = ProviderRegistry::new(vec![provider("a"), provider("b")]);
        let all = registry.all().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_default_provider() {
        let mut with_default = provider("main");
        with_default.is_default = true;
        let registry = ProviderRegistry::new(vec![provider("a"), with_default]);

        assert_eq!(registry.default_provider().unwrap().key, "main");
    }
}
