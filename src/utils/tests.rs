use super::error::{ClientError, RelayError};
use super::logging;
use crate::config::LogSettings;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::Level;

fn log(level: &str) -> LogSettings {
    LogSettings {
        level: level.to_string(),
    }
}

#[test]
fn logging_level_from_settings() {
    assert_eq!(logging::level(&LogSettings::default()), Level::INFO);
    assert_eq!(logging::level(&log("DEBUG")), Level::DEBUG);
    assert_eq!(logging::level(&log("warning")), Level::WARN);
    assert_eq!(logging::level(&log(" error ")), Level::ERROR);
    assert_eq!(logging::level(&log("nonsense")), Level::INFO);
}

#[test]
fn logging_init_is_repeatable() {
    // Should not panic
    logging::init(&log("info"));
    logging::init(&log("trace"));
}

#[test]
fn invalid_cursor_is_a_bad_request() {
    let response = RelayError::InvalidCursor("abc".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn malformed_body_is_a_bad_request() {
    let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let response = RelayError::MalformedBody(err).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn bind_error_is_an_internal_error() {
    let err = RelayError::Bind {
        addr: "127.0.0.1:1".to_string(),
        source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
    };
    assert!(err.to_string().contains("127.0.0.1:1"));
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn client_status_error_names_the_code() {
    let err = ClientError::Status(503);
    assert_eq!(err.to_string(), "relay responded with status 503");
}
