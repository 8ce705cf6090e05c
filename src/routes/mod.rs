pub mod chat;
pub mod documents;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_mw,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

/// Headroom for multipart boundaries and headers on top of the file itself,
/// so an oversized file reaches the size check instead of a transport error.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = state.config.extraction.max_upload_bytes + MULTIPART_OVERHEAD;

    let public_routes = Router::new().route("/api/health", get(health::health_check));

    let protected_routes = Router::new()
        .route(
            "/api/extract",
            post(documents::extract).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/complete", post(chat::complete))
        .route(
            "/api/sessions",
            post(chat::save_session).get(chat::list_sessions),
        )
        .route("/api/sessions/{id}", delete(chat::delete_session))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
