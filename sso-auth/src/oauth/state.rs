//! Redirect state handling.
//!
//! Two concerns live here: the opaque state blob that rides the provider
//! redirect round-trip, and the single-use anti-replay token embedded in it.
//!
//! The blob codec is deliberately tolerant on decode: state comes back as
//! attacker-controlled callback input and must never crash the flow. A
//! missing expected field is an authentication failure for the caller to
//! detect, not a codec error.

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde_json::{Map, Value};

/// Caller data round-tripped opaquely through the provider.
pub type StateBlob = Map<String, Value>;

/// Blob field carrying the anti-replay token.
pub const STATE_TOKEN_FIELD: &str = "token";

/// Blob field carrying the post-connect redirect target.
pub const STATE_TARGET_FIELD: &str = "target";

/// Encode a state blob into a single URL-safe token.
pub fn encode(blob: &StateBlob) -> String {
    let json = serde_json::to_string(blob).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode a state token produced by [`encode`].
///
/// Returns an empty blob for empty, malformed, or non-object input.
pub fn decode(raw: &str) -> StateBlob {
    let bytes = match URL_SAFE_NO_PAD.decode(raw.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return Map::new(),
    };

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Collaborator issuing and single-use-verifying anti-replay state tokens,
/// one per provider per caller session.
#[async_trait]
pub trait StateTokenService: Send + Sync {
    /// Issue a fresh token scoped to the given provider.
    async fn issue(&self, provider_key: &str) -> String;

    /// Verify and consume a token.
    ///
    /// Must be an atomic check-and-invalidate: of two concurrent calls with
    /// the same token, exactly one succeeds.
    async fn verify(&self, provider_key: &str, token: &str) -> bool;
}

/// In-memory state-token store with expiration.
pub struct InMemoryStateTokens {
    tokens: DashMap<String, DateTime<Utc>>,
    ttl: Duration,
}

impl InMemoryStateTokens {
    /// Create a store with the default TTL of 10 minutes.
    pub fn new() -> Self {
        Self::with_ttl(Duration::minutes(10))
    }

    /// Create a store with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            tokens: DashMap::new(),
            ttl,
        }
    }

    /// Drop expired entries. Call periodically to bound memory.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.tokens.retain(|_, expires_at| *expires_at > now);
    }

    fn entry_key(provider_key: &str, token: &str) -> String {
        format!("{}:{}", provider_key, token)
    }

    /// Generate a cryptographically random token.
    fn generate_token() -> String {
        let random_bytes: [u8; 32] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for InMemoryStateTokens {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateTokenService for InMemoryStateTokens {
    async fn issue(&self, provider_key: &str) -> String {
        let token = Self::generate_token();
        let expires_at = Utc::now() + self.ttl;
        self.tokens
            .insert(Self::entry_key(provider_key, &token), expires_at);
        token
    }

    async fn verify(&self, provider_key: &str, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }

        // DashMap::remove is the atomic check-and-invalidate: a second
        // concurrent verify of the same token finds nothing.
        match self.tokens.remove(&Self::entry_key(provider_key, token)) {
            Some((_, expires_at)) => Utc::now() <= expires_at,
            None => false,
        }
    }
}
