//! HTTP surface
//!
//! Routes, each mounted both at the root and under `/api`:
//! - `POST /emit`: producer ingestion
//! - `GET /messages?since=<ms>`: cursor polling
//! - `/socket`: push channel negotiation, accepts any method
//! - `GET /health`
//!
//! Handlers fetch the relay through the registry on every request, so the
//! first request initializes it and every later one shares it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::config::RelaySettings;
use crate::relay::{Relay, RelayRegistry};
use crate::store::Page;
use crate::transport::message::{EmitResponse, HealthResponse, NegotiateResponse};
use crate::utils::RelayError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RelayRegistry>,
    pub relay_settings: RelaySettings,
    /// Advertised to clients negotiating the push channel.
    pub push_url: String,
}

impl AppState {
    fn relay(&self) -> Arc<Relay> {
        self.registry.relay(&self.relay_settings)
    }
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub since: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route(
            "/emit",
            post(emit).options(preflight).fallback(method_not_allowed),
        )
        .route(
            "/messages",
            get(messages).options(preflight).fallback(method_not_allowed),
        )
        .route("/socket", any(negotiate))
        .route("/health", get(health));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(cors())
        .with_state(state)
}

pub async fn start_http_server(addr: &str, state: AppState) -> Result<(), RelayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    info!("HTTP server listening on http://{addr}");

    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Parse the `since` cursor. Absent or empty means "from the beginning".
pub fn parse_cursor(raw: Option<&str>) -> Result<i64, RelayError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse()
            .map_err(|_| RelayError::InvalidCursor(value.to_string())),
    }
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// `POST /emit`
async fn emit(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<EmitResponse>, RelayError> {
    // an empty body is an ambiguous producer, not a protocol error
    let payload: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(RelayError::MalformedBody)?
    };
    debug!(%payload, "data received");

    let message = state.relay().submit(&payload);
    Ok(Json(EmitResponse::stored(message)))
}

/// `GET /messages?since=<ms>`
async fn messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Page>, RelayError> {
    let since = parse_cursor(query.since.as_deref())?;
    Ok(Json(state.relay().query(since)))
}

/// `/socket`: make sure the relay exists and tell the client where to connect.
async fn negotiate(State(state): State<AppState>) -> Json<NegotiateResponse> {
    state.relay();
    Json(NegotiateResponse {
        status: "ready".to_string(),
        push_url: state.push_url.clone(),
    })
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let relay = state.relay();
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: relay.connection_count(),
        messages: relay.stored(),
    })
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "message": "Method not allowed" })),
    )
}
