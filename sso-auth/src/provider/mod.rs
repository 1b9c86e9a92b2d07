//! Identity-provider configuration.
//!
//! A provider is a configuration record, not a class hierarchy: the generic
//! flow engine composes over it, and per-provider variation (extra authorize
//! params, custom field mapping, token body encoding) is expressed as data.

pub mod registry;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::BodyFormat;

pub use registry::{ProviderRegistry, ProviderStore};

/// Maps provider profile field names onto the canonical profile shape.
///
/// Defaults follow common OAuth2/OIDC claim names; admins override them per
/// provider without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub email: String,
    pub photo: String,
    pub name: String,
    pub full_name: String,
    pub unique_id: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            email: "email".to_string(),
            photo: "picture".to_string(),
            name: "displayname".to_string(),
            full_name: "name".to_string(),
            unique_id: "user_id".to_string(),
        }
    }
}

/// Registration record for one identity provider.
///
/// Immutable per request. Owned by the external config store; the flow engine
/// only reads it, loading it once per flow instance.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Unique provider key, e.g. "acme-id".
    pub key: String,
    pub authorize_url: String,
    pub token_url: String,
    pub profile_url: String,
    /// OAuth application identifier. Also the association key that maps an
    /// API-issued token request back to this provider.
    pub client_id: String,
    pub client_secret: SecretString,
    /// Requested scope string, space separated.
    pub scope: String,
    pub field_mapping: FieldMapping,
    pub active: bool,
    pub is_default: bool,
    /// Send the access token as an `Authorization: Bearer` header on profile
    /// requests instead of an `access_token` query parameter.
    pub bearer_token: bool,
    /// Whether the server-to-server API token issuance path is enabled.
    pub allow_access_tokens: bool,
    /// Optional `prompt` value, passed through to the authorize URI
    /// uninterpreted. Providers vary; the engine does not validate it.
    pub prompt: Option<String>,
    /// Encoding of the token endpoint request body.
    pub token_body_format: BodyFormat,
    /// Extra parameters appended to the authorize URI.
    pub authorize_params: Vec<(String, String)>,
    /// Extra parameters merged into the token request body.
    pub token_params: Vec<(String, String)>,
    /// Extra parameters merged into the profile request.
    pub profile_params: Vec<(String, String)>,
}

impl ProviderConfig {
    /// Create an active provider with protocol defaults.
    pub fn new(
        key: &str,
        authorize_url: &str,
        token_url: &str,
        profile_url: &str,
        client_id: &str,
        client_secret: SecretString,
    ) -> Self {
        Self {
            key: key.to_string(),
            authorize_url: authorize_url.to_string(),
            token_url: token_url.to_string(),
            profile_url: profile_url.to_string(),
            client_id: client_id.to_string(),
            client_secret,
            scope: String::new(),
            field_mapping: FieldMapping::default(),
            active: true,
            is_default: false,
            bearer_token: false,
            allow_access_tokens: false,
            prompt: None,
            token_body_format: BodyFormat::FormUrlEncoded,
            authorize_params: Vec::new(),
            token_params: Vec::new(),
            profile_params: Vec::new(),
        }
    }

    /// True when the provider carries both a client ID and a client secret.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.expose_secret().is_empty()
    }

    /// True when the provider may participate in flows.
    pub fn is_active(&self) -> bool {
        self.active
    }
}
