use axum::{extract::State, Json};
use serde::Serialize;

use crate::config::StoreBackend;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: StoreBackend,
    pub pdf_upload_enabled: bool,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        store: state.config.database.backend,
        pdf_upload_enabled: state.config.features.pdf_upload_enabled,
    })
}
