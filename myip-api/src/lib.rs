//! # myip API Server
//!
//! HTTP surface of the myip service: tells callers their address, how often
//! it has been seen, and what the regional registry knows about it.
//!
//! ## Endpoints
//!
//! - `GET /` - Lookup for the caller, HTML or JSON by negotiation
//! - `GET /api` and any path starting with `/api` - Lookup for the caller, always JSON
//! - `GET /health` - Backend connectivity check
//!
//! `?ip=<address>` on any lookup route reports on that address instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use myip_api::{ApiConfig, ApiServer, AppState};
//!
//! let config = ApiConfig::from_env()?;
//! let addr = config.listen_addr()?;
//! let server = ApiServer::new(AppState::from_config(config).await?);
//! server.run(addr).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod dto;
mod error;
mod handlers;
mod render;
mod routes;
mod state;

pub use client::{client_address, wants_json, UNKNOWN_CLIENT};
pub use dto::ApiResponse;
pub use error::ApiError;
pub use render::{escape_html, render_page};
pub use routes::create_router;
pub use state::{ApiConfig, AppState, LogFormat};

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// API server for myip.
pub struct ApiServer {
    state: Arc<AppState>,
}

impl ApiServer {
    /// Creates a new API server over the given state.
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Creates the router with all routes configured.
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Runs the server on the given address until Ctrl+C.
    pub async fn run(self, addr: impl Into<SocketAddr>) -> std::io::Result<()> {
        let addr = addr.into();
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("myip server listening on {}", addr);

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(err) => {
            warn!(error = %err, "Cannot listen for Ctrl+C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
