//! Callback-to-connect session stash.
//!
//! Bridges the provider callback and the account-connect step: the callback
//! stashes the token bundle and normalized profile under an opaque id, and
//! the connect step reads it back at most once within a short window.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::profile::CanonicalProfile;
use crate::error::Error;

/// How long a stashed session stays readable.
pub const STASH_TTL_SECONDS: i64 = 300;

/// The record bridging callback and connect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StashedSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub profile: CanonicalProfile,
}

/// Stash collaborator.
///
/// Expiry is time-based and enforced by the store; a read does not guarantee
/// deletion. Callers must never assume an entry is still present.
#[async_trait]
pub trait StashStore: Send + Sync {
    /// Store a record, returning its opaque identifier.
    async fn put(&self, record: StashedSession, ttl: Duration) -> Result<String, Error>;

    /// Read a record without consuming it. Absent or expired entries read as
    /// `None`.
    async fn get_and_keep(&self, id: &str) -> Result<Option<StashedSession>, Error>;
}

/// In-memory stash store.
pub struct InMemoryStashStore {
    entries: DashMap<String, (StashedSession, DateTime<Utc>)>,
}

impl InMemoryStashStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Drop expired entries. Call periodically to bound memory.
    pub fn cleanup_expired(&self) {
        let now = Utc::now();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
    }

    fn generate_id() -> String {
        let random_bytes: [u8; 16] = rand::thread_rng().gen();
        hex::encode(random_bytes)
    }
}

impl Default for InMemoryStashStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StashStore for InMemoryStashStore {
    async fn put(&self, record: StashedSession, ttl: Duration) -> Result<String, Error> {
        let id = Self::generate_id();
        self.entries.insert(id.clone(), (record, Utc::now() + ttl));
        Ok(id)
    }

    async fn get_and_keep(&self, id: &str) -> Result<Option<StashedSession>, Error> {
        match self.entries.get(id) {
            Some(entry) => {
                let (record, expires_at) = entry.value();
                if Utc::now() > *expires_at {
                    drop(entry);
                    self.entries.remove(id);
                    Ok(None)
                } else {
                    Ok(Some(record.clone()))
                }
            }
            None => Ok(None),
        }
    }
}
