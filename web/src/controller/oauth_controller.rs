//! Controller for the browser-facing SSO flow.
//!
//! Note: these endpoints work via browser redirects which cannot set custom
//! headers, so they carry no API versioning or cookie requirements.

use crate::{AppState, Error};

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Json, Redirect};
use serde::Deserialize;
use serde_json::{Map, Value};

use sso_auth::oauth::flow::CallbackParams;
use sso_auth::oauth::state::STATE_TARGET_FIELD;

/// Query parameters for starting the SSO flow.
#[derive(Debug, Deserialize)]
pub struct AuthorizeQuery {
    /// Local URL to land on after the account-connect step.
    pub target: Option<String>,
}

/// Query parameters delivered by the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

/// Query parameters for the account-connect handoff.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub stash_id: String,
}

/// GET /oauth/{provider}/authorize
///
/// Starts the SSO flow by redirecting the browser to the provider's
/// authorize endpoint.
#[utoipa::path(
    get,
    path = "/oauth/{provider}/authorize",
    params(
        ("provider" = String, Path, description = "Provider key"),
        ("target" = Option<String>, Query, description = "Local URL to land on after connect"),
    ),
    responses(
        (status = 307, description = "Redirect to the provider's authorize endpoint"),
        (status = 404, description = "Unknown provider"),
        (status = 500, description = "Provider not configured"),
    )
)]
pub async fn authorize(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<AuthorizeQuery>,
) -> Result<impl IntoResponse, Error> {
    let flow = app_state.flow_for(&provider).await?;

    let mut caller_state = Map::new();
    if let Some(target) = params.target {
        caller_state.insert(STATE_TARGET_FIELD.to_string(), Value::String(target));
    }

    let url = flow.authorize_url(caller_state, &[]).await?;
    Ok(Redirect::temporary(&url))
}

/// GET /oauth/{provider}/callback
///
/// Handles the provider redirect: exchanges the code, verifies state, and
/// stashes the session, then forwards the browser to the connect URL with
/// `target` and `stash_id` query parameters.
#[utoipa::path(
    get,
    path = "/oauth/{provider}/callback",
    params(
        ("provider" = String, Path, description = "Provider key"),
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("error" = Option<String>, Query, description = "Provider error code"),
        ("state" = Option<String>, Query, description = "Opaque state from the authorize redirect"),
    ),
    responses(
        (status = 307, description = "Redirect to the account-connect URL"),
        (status = 400, description = "Malformed callback"),
        (status = 403, description = "State verification failed"),
        (status = 502, description = "Provider error during the exchange"),
    )
)]
pub async fn callback(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackQuery>,
) -> Result<impl IntoResponse, Error> {
    let flow = app_state.flow_for(&provider).await?;

    let outcome = flow
        .handle_callback(CallbackParams {
            code: params.code,
            error: params.error,
            state: params.state,
        })
        .await?;

    let url = format!(
        "{}?target={}&stash_id={}",
        app_state.config.connect_url(),
        urlencoding::encode(outcome.target.as_deref().unwrap_or_default()),
        urlencoding::encode(&outcome.stash_id),
    );
    Ok(Redirect::temporary(&url))
}

/// GET /oauth/{provider}/connect
///
/// Account-connect handoff: reads the stashed session once and returns the
/// merged connect data for the host's account linker.
#[utoipa::path(
    get,
    path = "/oauth/{provider}/connect",
    params(
        ("provider" = String, Path, description = "Provider key"),
        ("stash_id" = String, Query, description = "Stash identifier from the callback redirect"),
    ),
    responses(
        (status = 200, description = "Connect data for the account linker"),
        (status = 410, description = "Stashed session absent or expired"),
    )
)]
pub async fn connect(
    State(app_state): State<AppState>,
    Path(provider): Path<String>,
    Query(params): Query<ConnectQuery>,
) -> Result<impl IntoResponse, Error> {
    let flow = app_state.flow_for(&provider).await?;
    let connect_data = flow.prepare_connect(&params.stash_id, Map::new()).await?;
    Ok(Json(connect_data))
}
