//! Axum router construction for the read API.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the Axum router.
///
/// - `GET /api/last-update` -- completion time of the last successful run
///
/// CORS allows any origin; the API is read-only.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/last-update", get(handlers::get_last_update))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
