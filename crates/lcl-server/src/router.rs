use axum::routing::{get, post};
use axum::Router;
use lcl_attest::http::LISTING_PATH;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all signer endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(LISTING_PATH, post(handler::sign_listing_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
