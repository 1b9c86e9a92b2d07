use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use sso_auth::error::{
    ConfigErrorKind, Error as SsoError, ErrorKind, ExchangeErrorKind, FlowErrorKind,
    IssuanceErrorKind,
};

extern crate log;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(pub SsoError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

/// Structured error body returned to API callers.
///
/// Messages are fixed per error kind; provider payloads and token material
/// never reach the client.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: &'static str,
}

// 4xx for caller fault, 5xx for provider/server misconfiguration.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self.0.error_kind {
            ErrorKind::Config(config_error_kind) => {
                log::error!("Provider configuration error: {:?}", self.0);
                match config_error_kind {
                    ConfigErrorKind::UnknownProvider => (
                        StatusCode::NOT_FOUND,
                        "unknown_provider",
                        "No such identity provider",
                    ),
                    ConfigErrorKind::NotConfigured => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "provider_not_configured",
                        "Identity provider is not configured",
                    ),
                }
            }
            ErrorKind::Exchange(exchange_error_kind) => {
                log::warn!("Provider exchange failed: {:?}", self.0);
                match exchange_error_kind {
                    ExchangeErrorKind::Transport => (
                        StatusCode::BAD_GATEWAY,
                        "provider_unreachable",
                        "Could not reach the identity provider",
                    ),
                    ExchangeErrorKind::Provider => (
                        StatusCode::BAD_GATEWAY,
                        "provider_rejected",
                        "The identity provider rejected the request",
                    ),
                    ExchangeErrorKind::Server => (
                        StatusCode::BAD_GATEWAY,
                        "provider_error",
                        "The identity provider returned an unexpected response",
                    ),
                }
            }
            ErrorKind::Flow(flow_error_kind) => match flow_error_kind {
                FlowErrorKind::Validation => (
                    StatusCode::BAD_REQUEST,
                    "invalid_callback",
                    "Malformed sign-in callback",
                ),
                FlowErrorKind::AuthState => (
                    StatusCode::FORBIDDEN,
                    "invalid_state",
                    "Sign-in session could not be verified",
                ),
                FlowErrorKind::MissingSession => (
                    StatusCode::GONE,
                    "session_expired",
                    "Sign-in session has expired, please start over",
                ),
            },
            ErrorKind::Issuance(issuance_error_kind) => match issuance_error_kind {
                IssuanceErrorKind::ClientMismatch => (
                    StatusCode::FORBIDDEN,
                    "client_mismatch",
                    "Client ID does not match the provider",
                ),
                IssuanceErrorKind::InactiveProvider => (
                    StatusCode::FORBIDDEN,
                    "provider_inactive",
                    "Identity provider is not active",
                ),
                IssuanceErrorKind::Disallowed => (
                    StatusCode::FORBIDDEN,
                    "issuance_disallowed",
                    "Identity provider does not allow token issuance",
                ),
                IssuanceErrorKind::NotFound => (
                    StatusCode::NOT_FOUND,
                    "unknown_client_id",
                    "No identity provider owns this client ID",
                ),
                IssuanceErrorKind::Forbidden => (
                    StatusCode::FORBIDDEN,
                    "invalid_access_token",
                    "The provider access token could not be validated",
                ),
            },
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl<E> From<E> for Error
where
    E: Into<SsoError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sso_auth::error::{exchange_error, flow_error, issuance_error};

    fn status_of(err: SsoError) -> StatusCode {
        Error(err).into_response().status()
    }

    #[test]
    fn test_caller_faults_map_to_4xx() {
        assert_eq!(
            status_of(flow_error(FlowErrorKind::Validation, "missing code")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(flow_error(FlowErrorKind::AuthState, "replayed state")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(flow_error(FlowErrorKind::MissingSession, "expired")),
            StatusCode::GONE
        );
        assert_eq!(
            status_of(issuance_error(IssuanceErrorKind::NotFound, "unknown")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(issuance_error(IssuanceErrorKind::ClientMismatch, "mismatch")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(issuance_error(IssuanceErrorKind::Forbidden, "bad token")),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_provider_faults_map_to_5xx() {
        assert_eq!(
            status_of(exchange_error(ExchangeErrorKind::Transport, "timeout")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(exchange_error(ExchangeErrorKind::Provider, "invalid_grant")),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_body_never_echoes_the_source_message() {
        // The source carries provider detail; the body must stay generic.
        let response =
            Error(exchange_error(ExchangeErrorKind::Provider, "at-s3cret-token")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!body.contains("at-s3cret-token"));
        assert!(body.contains("provider_rejected"));
    }
}
