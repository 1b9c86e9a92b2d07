use crate::AppState;

use axum::{
    routing::{get, post},
    Router,
};

use crate::controller::{oauth_controller, token_controller};

use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI spec. To be a part
// of the rendered spec, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
    info(title = "SSO Platform API"),
    paths(
        oauth_controller::authorize,
        oauth_controller::callback,
        oauth_controller::connect,
        token_controller::exchange,
    ),
    components(schemas(token_controller::TokenExchangeRequest))
)]
pub struct ApiDoc;

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(oauth_routes(app_state.clone()))
        .merge(token_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/rapidoc"))
}

pub fn oauth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/oauth/{provider}/authorize", get(oauth_controller::authorize))
        .route("/oauth/{provider}/callback", get(oauth_controller::callback))
        .route("/oauth/{provider}/connect", get(oauth_controller::connect))
        .with_state(app_state)
}

pub fn token_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/api/oauth/token", post(token_controller::exchange))
        .with_state(app_state)
}
