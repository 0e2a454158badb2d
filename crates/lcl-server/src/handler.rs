use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;
use lcl_attest::{ListingRequest, LocalSigner, SignedListing};
use serde_json::json;

use crate::error::{ServerError, ServerResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub signer: Arc<LocalSigner>,
}

impl AppState {
    pub fn new(signer: LocalSigner) -> Self {
        Self {
            signer: Arc::new(signer),
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Info handler: service version, program id and the catalogs served.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let catalogs: Vec<_> = state
        .signer
        .catalogs()
        .map(|(name, id, key)| json!({ "name": name, "id": id.0, "signer": key.to_bs58() }))
        .collect();
    Json(json!({
        "name": "lcl-server",
        "version": env!("CARGO_PKG_VERSION"),
        "program_id": state.signer.deriver().program_id().to_bs58(),
        "catalogs": catalogs,
    }))
}

/// `POST /api/catalog/listing`: sign a listing request.
pub async fn sign_listing_handler(
    State(state): State<AppState>,
    body: Result<Json<ListingRequest>, JsonRejection>,
) -> ServerResult<Json<SignedListing>> {
    let Json(request) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let signed = state.signer.sign_request(&request)?;
    tracing::info!(
        catalog = %request.catalog,
        uuid = %signed.uuid,
        owner = %request.owner,
        "signed listing"
    );
    Ok(Json(signed))
}
