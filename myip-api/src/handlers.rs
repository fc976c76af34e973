//! API route handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::debug;

use crate::client::{client_address, wants_json};
use crate::dto::{ApiResponse, HealthResponse};
use crate::error::ApiError;
use crate::render::render_page;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Query string of a lookup request.
#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    /// Address to report instead of the caller's own
    pub ip: Option<String>,
}

/// GET /, GET /api, and every other path starting with `/api`
///
/// Always answers 200: degradations are already absorbed by the service.
pub async fn lookup(
    State(state): State<Arc<AppState>>,
    query: Option<Query<LookupQuery>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let query_ip = query.as_ref().and_then(|Query(q)| q.ip.as_deref());
    let address = client_address(query_ip, &headers, connect.map(|ConnectInfo(peer)| peer));
    let json = wants_json(&uri, &headers);

    let response = state.service.fetch(&address).await;
    debug!(
        address = %response.ip,
        count = response.count_call,
        source = ?response.source,
        json,
        "Lookup served"
    );

    let body = ApiResponse::from(response);
    if json {
        Json(body).into_response()
    } else {
        Html(render_page(&body)).into_response()
    }
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    state.service.store().ping().await?;

    Ok(Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    }))
}

/// Fallback for unrouted paths: anything under the `/api` prefix
/// (`/api/`, `/apiv2`) is a lookup, the rest is 404.
pub async fn fallback(
    state: State<Arc<AppState>>,
    query: Option<Query<LookupQuery>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    if uri.path().starts_with("/api") {
        return lookup(state, query, connect, uri, headers).await;
    }
    ApiError::not_found(format!("No route for {}", uri.path())).into_response()
}
