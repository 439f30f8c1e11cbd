//! HTTP API surface for the Sanpai service.
//!
//! A thin Axum layer over `sanpai-core`: handlers parse the request,
//! build the per-request services over the shared pool, and translate
//! the core error taxonomy into status codes -- 404 for missing
//! entities, 400 for every expected rejection, 500 (plus an operational
//! log line) for configuration and storage failures.
//!
//! # Modules
//!
//! - [`state`] -- Shared [`AppState`](state::AppState)
//! - [`handlers`] -- Endpoint handlers
//! - [`router`] -- Route table and middleware stack
//! - [`server`] -- TCP bind and serve loop
//! - [`error`] -- [`ApiError`](error::ApiError) and status mapping

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary items at crate root.
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::AppState;
