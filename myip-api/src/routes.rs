//! API route configuration.

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Lookup, negotiated
        .route("/", get(handlers::lookup))

        // Lookup, always JSON; other `/api` prefixed paths reach the fallback
        .route("/api", get(handlers::lookup))
        .route("/api/*rest", get(handlers::lookup))

        .fallback(handlers::fallback)
        .with_state(state)
}
