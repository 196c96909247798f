use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use super::http::{AppState, build_router, parse_cursor};
use crate::config::RelaySettings;
use crate::relay::RelayRegistry;

fn state() -> AppState {
    AppState {
        registry: Arc::new(RelayRegistry::new()),
        relay_settings: RelaySettings::default(),
        push_url: "ws://127.0.0.1:8080".to_string(),
    }
}

/// Send a request to the app and return (status, parsed JSON body).
async fn send(state: &AppState, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = build_router(state.clone()).oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[test]
fn test_parse_cursor() {
    assert_eq!(parse_cursor(None).unwrap(), 0);
    assert_eq!(parse_cursor(Some("")).unwrap(), 0);
    assert_eq!(parse_cursor(Some("1700000000000")).unwrap(), 1_700_000_000_000);
    assert!(parse_cursor(Some("yesterday")).is_err());
}

#[tokio::test]
async fn test_emit_stores_message() {
    let state = state();
    let (status, body) = send(&state, Method::POST, "/emit", r#"{"message":"hello"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Message stored successfully");
    assert_eq!(body["data"]["content"], "hello");
    assert_eq!(body["data"]["type"], "ai");
    assert_eq!(state.registry.get().unwrap().stored(), 1);
}

#[tokio::test]
async fn test_emit_unknown_shape_uses_placeholder() {
    let state = state();
    let (status, body) = send(&state, Method::POST, "/api/emit", r#"{"foo":1}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["content"], "No message content");
}

#[tokio::test]
async fn test_emit_malformed_body_is_rejected() {
    let state = state();
    let (status, body) = send(&state, Method::POST, "/emit", "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    // protocol errors never reach the store
    assert_eq!(state.registry.get().map_or(0, |r| r.stored()), 0);
}

#[tokio::test]
async fn test_emit_wrong_method() {
    let state = state();
    let (status, body) = send(&state, Method::GET, "/emit", "").await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], "Method not allowed");
}

#[tokio::test]
async fn test_options_preflight_succeeds() {
    let state = state();
    let (status, _) = send(&state, Method::OPTIONS, "/emit", "").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, Method::OPTIONS, "/api/messages", "").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_messages_on_empty_relay() {
    let state = state();
    let (status, body) = send(&state, Method::GET, "/messages?since=0", "").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "messages": [], "lastTimestamp": 0 }));
}

#[tokio::test]
async fn test_messages_returns_newer_than_cursor() {
    let state = state();
    send(&state, Method::POST, "/emit", r#"{"message":"one"}"#).await;
    let (_, second) = send(&state, Method::POST, "/emit", r#"{"body":"two"}"#).await;

    let (status, body) = send(&state, Method::GET, "/api/messages", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["lastTimestamp"], second["data"]["timestamp"]);

    let first_ts = body["messages"][0]["timestamp"].as_i64().unwrap();
    let uri = format!("/messages?since={first_ts}");
    let (_, body) = send(&state, Method::GET, &uri, "").await;
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["content"], "two");
}

#[tokio::test]
async fn test_messages_invalid_cursor() {
    let state = state();
    let (status, body) = send(&state, Method::GET, "/messages?since=abc", "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_messages_wrong_method() {
    let state = state();
    let (status, _) = send(&state, Method::POST, "/messages", "{}").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_socket_negotiation_accepts_any_method() {
    let state = state();
    assert!(state.registry.get().is_none());

    for method in [Method::GET, Method::POST, Method::PUT] {
        let (status, body) = send(&state, method, "/api/socket", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ready");
        assert_eq!(body["pushUrl"], "ws://127.0.0.1:8080");
    }
    assert!(state.registry.get().is_some());
}

#[tokio::test]
async fn test_health_reports_counts() {
    let state = state();
    send(&state, Method::POST, "/emit", r#""plain""#).await;

    let (status, body) = send(&state, Method::GET, "/health", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["messages"], 1);
    assert_eq!(body["connections"], 0);
}
