use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::store::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(rename = "keyVault")]
    pub key_vault: &'static str,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Always 200. Reports whether the vault gateway was initialized, not whether
/// the vault is currently reachable.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        key_vault: if state.vault_connected() {
            "connected"
        } else {
            "not connected"
        },
    })
}
