//! Axum router construction for the Observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin map clients.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::operator;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness probe
/// - `GET /ws/render-model` -- `WebSocket` render model stream
/// - `GET /api/render-model` -- current render model
/// - `GET /api/status` -- scheduler status
/// - `POST /api/sync/start` -- start polling
/// - `POST /api/sync/stop` -- stop polling
///
/// CORS allows any origin so a map client served from elsewhere can read
/// the API.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws/render-model", get(ws::ws_render_model))
        // REST API
        .route("/api/render-model", get(handlers::get_render_model))
        .route("/api/status", get(operator::status))
        // Operator
        .route("/api/sync/start", post(operator::start))
        .route("/api/sync/stop", post(operator::stop))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
