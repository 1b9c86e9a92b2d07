//! # sso-auth
//!
//! Generic OAuth2 single-sign-on flow engine:
//! - authorize-redirect construction with anti-replay state tokens
//! - authorization-code and refresh-token exchanges
//! - provider profile retrieval and canonical normalization
//! - short-lived session stashing between callback and account connect
//! - API token issuance against a provider access token
//!
//! ## Architecture
//!
//! The engine is a composition of a generic flow over per-provider
//! configuration records; provider variation is data, not subclassing.
//! Storage, account linking, and token persistence are collaborator traits
//! the host implements; in-memory defaults ship for the state-token store,
//! stash, and cache. All outbound HTTP goes through the [`http::HttpTransport`]
//! boundary, whose default implementation owns retry policy.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sso_auth::{
//!     oauth::{SsoFlow, InMemoryStashStore, InMemoryStateTokens},
//!     provider::ProviderRegistry,
//!     http::ReqwestTransport,
//! };
//! ```

pub mod account;
pub mod error;
pub mod http;
pub mod issuance;
pub mod oauth;
pub mod provider;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
