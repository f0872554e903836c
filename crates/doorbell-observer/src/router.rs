//! Axum router construction for the Observer API.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Observer server.
///
/// The router includes:
/// - `GET /health` -- liveness
/// - `GET /api/status` -- current space status
/// - `GET /api/events` -- query events
/// - `GET /api/events/{id}` -- single event
/// - `GET /api/stats` -- cached statistics report
/// - `GET /api/export.csv` -- whole event log as CSV
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::get_status))
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/{id}", get(handlers::get_event))
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/export.csv", get(handlers::export_csv))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
