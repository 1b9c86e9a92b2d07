//! Account-linking and API-token-issuance collaborator boundaries.
//!
//! The host application owns account records and token persistence; the
//! engine only drives these interfaces.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::oauth::profile::CanonicalProfile;

/// Options for an account-link call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Update an existing linked account's profile fields from the incoming
    /// canonical profile.
    pub sync_existing: bool,
}

/// Account-link collaborator.
///
/// Linking is keyed by the canonical profile's `UniqueID`; a caller-supplied
/// local user id is never trusted.
#[async_trait]
pub trait AccountLink: Send + Sync {
    /// Link the incoming identity to a local account, creating one if the
    /// host's policy allows. Returns the local user id.
    async fn connect(
        &self,
        unique_id: &str,
        provider_key: &str,
        profile: &CanonicalProfile,
        options: ConnectOptions,
    ) -> Result<String, Error>;
}

/// Token-issuance collaborator: mints the host's API tokens.
#[async_trait]
pub trait ApiTokenIssuer: Send + Sync {
    /// Issue an opaque API token for a local user.
    async fn issue(
        &self,
        local_user_id: &str,
        expires_at: DateTime<Utc>,
        context: &str,
    ) -> Result<String, Error>;
}
