//! Axum router construction for the API server.
//!
//! Assembles all routes into a single [`Router`] with CORS middleware
//! enabled for cross-origin frontend access and per-request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router for the Sanpai API.
///
/// `POST /abilities/{id}/acquire` is a legacy alias kept for older
/// clients; it shares the purchase handler.
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Prayers
        .route("/shrines/{id}/pray", post(handlers::pray))
        .route("/shrines/{id}/remote-pray", post(handlers::remote_pray))
        // Ability tree
        .route("/abilities/{id}/purchase", post(handlers::purchase_ability))
        .route("/abilities/{id}/acquire", post(handlers::purchase_ability))
        .route("/user/reset-abilities", post(handlers::reset_abilities))
        // Read-only projections
        .route("/users/{id}/level-info", get(handlers::level_info))
        .route("/users/{id}/pray-distance", get(handlers::pray_distance))
        .route("/users/{id}/worship-limit", get(handlers::worship_limit))
        .route("/users/{id}/abilities", get(handlers::owned_abilities))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
