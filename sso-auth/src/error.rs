//! Error types for the `sso-auth` crate.
//!
//! Follows the layered pattern used across the workspace: a root Error struct
//! holding an error kind tree plus an optional source for chaining. The web
//! layer maps these kinds onto HTTP status codes.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for the SSO engine.
/// Holds error kind and optional source for error chaining.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

/// Major categories of errors in the SSO engine.
#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Config(ConfigErrorKind),
    Exchange(ExchangeErrorKind),
    Flow(FlowErrorKind),
    Issuance(IssuanceErrorKind),
}

/// Provider configuration problems surfaced before any network call.
#[derive(Debug, PartialEq)]
pub enum ConfigErrorKind {
    /// No provider registered under the requested key.
    UnknownProvider,
    /// Provider is registered but lacks a client ID or secret.
    NotConfigured,
}

/// Errors from the token exchange and profile fetch HTTP calls.
#[derive(Debug, PartialEq)]
pub enum ExchangeErrorKind {
    /// Network-level failure (connect, timeout, TLS).
    Transport,
    /// The provider returned a structured `error`/`error_description` body.
    Provider,
    /// Non-2xx response with no parseable provider error body.
    Server,
}

/// Errors from the browser-facing flow state machine.
#[derive(Debug, PartialEq)]
pub enum FlowErrorKind {
    /// Malformed callback input, e.g. a missing `code` parameter.
    Validation,
    /// State-token verification failed. Treated as a security event and
    /// logged distinctly from ordinary validation errors.
    AuthState,
    /// Stash entry absent or past its expiry.
    MissingSession,
}

/// Errors from the server-to-server token issuance path.
#[derive(Debug, PartialEq)]
pub enum IssuanceErrorKind {
    /// Presented client ID does not match the resolved provider's own.
    ClientMismatch,
    /// Provider exists but is not active.
    InactiveProvider,
    /// Provider does not allow API token issuance.
    Disallowed,
    /// No provider owns the presented client ID.
    NotFound,
    /// The presented OAuth access token could not be validated against the
    /// provider. Never surfaced as a server error.
    Forbidden,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Config(kind) => write!(f, "Config error: {:?}", kind),
            ErrorKind::Exchange(kind) => write!(f, "Exchange error: {:?}", kind),
            ErrorKind::Flow(kind) => write!(f, "Flow error: {:?}", kind),
            ErrorKind::Issuance(kind) => write!(f, "Issuance error: {:?}", kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Exchange(ExchangeErrorKind::Transport),
        }
    }
}

impl From<reqwest_middleware::Error> for Error {
    fn from(err: reqwest_middleware::Error) -> Self {
        Error {
            source: Some(Box::new(err)),
            error_kind: ErrorKind::Exchange(ExchangeErrorKind::Transport),
        }
    }
}

/// Helper function to create config errors.
pub fn config_error(kind: ConfigErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Config(kind),
    }
}

/// Helper function to create exchange errors.
pub fn exchange_error(kind: ExchangeErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Exchange(kind),
    }
}

/// Helper function to create flow errors.
pub fn flow_error(kind: FlowErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Flow(kind),
    }
}

/// Helper function to create issuance errors.
pub fn issuance_error(kind: IssuanceErrorKind, message: &str) -> Error {
    Error {
        source: Some(message.to_string().into()),
        error_kind: ErrorKind::Issuance(kind),
    }
}
