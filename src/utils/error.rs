//! The `error` module defines the error types used within the `hookrelay`
//! application.
//!
//! `RelayError` covers the server side: binding, I/O and the protocol errors
//! that are reported back to an HTTP caller. `ClientError` covers transport
//! failures seen by the polling and push consumers; those are recovered
//! locally by the clients and never reach the message history.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed request body: {0}")]
    MalformedBody(#[source] serde_json::Error),

    #[error("invalid cursor '{0}': expected integer milliseconds")]
    InvalidCursor(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

impl RelayError {
    fn status(&self) -> StatusCode {
        match self {
            RelayError::MalformedBody(_) | RelayError::InvalidCursor(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = json!({ "status": "error", "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("relay responded with status {0}")]
    Status(u16),

    #[error("failed to decode relay response: {0}")]
    Decode(#[from] serde_json::Error),
}
