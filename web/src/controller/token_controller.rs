//! Controller for the server-to-server API token exchange.

use crate::{AppState, Error};

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use utoipa::ToSchema;

/// Request body for the access token exchange.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenExchangeRequest {
    /// OAuth client ID of the owning provider.
    pub client_id: String,
    /// Access token obtained from that provider.
    pub oauth_access_token: String,
}

/// POST /api/oauth/token
///
/// Trades a provider access token for a local API token. The token is
/// re-validated against the provider before issuance.
#[utoipa::path(
    post,
    path = "/api/oauth/token",
    request_body = TokenExchangeRequest,
    responses(
        (status = 200, description = "Issued API token with expiry"),
        (status = 403, description = "Token invalid, client mismatch, or issuance disallowed"),
        (status = 404, description = "Unknown client ID"),
        (status = 502, description = "Provider unreachable"),
    )
)]
pub async fn exchange(
    State(app_state): State<AppState>,
    Json(request): Json<TokenExchangeRequest>,
) -> Result<impl IntoResponse, Error> {
    let issued = app_state
        .token_issuer()
        .issue(&request.client_id, &request.oauth_access_token)
        .await?;
    Ok(Json(issued))
}
