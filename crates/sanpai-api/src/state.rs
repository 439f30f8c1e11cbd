//! Shared application state for the API server.
//!
//! [`AppState`] holds the connection pool and gameplay configuration.
//! There is deliberately no other shared mutable state: every request
//! reads and writes through the store, so worker restarts and concurrent
//! requests always see the same truth.

use sanpai_core::GameplayConfig;
use sanpai_db::PostgresPool;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. Handlers build the per-request services on top of the
/// pool.
#[derive(Clone)]
pub struct AppState {
    /// The `PostgreSQL` connection pool.
    pub pool: PostgresPool,
    /// Gameplay tuning (experience per prayer kind).
    pub gameplay: GameplayConfig,
}

impl AppState {
    /// Create application state over a connected pool.
    pub const fn new(pool: PostgresPool, gameplay: GameplayConfig) -> Self {
        Self { pool, gameplay }
    }
}
