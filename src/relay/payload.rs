//! Producer payload normalization
//!
//! Producers post free-form JSON. Depending on the pipeline revision the text
//! arrives as a bare string or under `message`, `content` or `body`, and the
//! value under those fields may itself be structured. Everything is reduced to
//! text here so nothing downstream ever sees the union.

use serde_json::Value;

use crate::store::{Message, MessageKind};

/// Content used when a payload carries nothing recognizable.
pub const PLACEHOLDER: &str = "No message content";

/// Fields checked for content, in priority order.
pub const CONTENT_FIELDS: [&str; 3] = ["message", "content", "body"];

/// Normalized producer input, ready to be stamped into a `Message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub content: String,
    pub kind: MessageKind,
}

impl Submission {
    pub fn from_payload(payload: &Value) -> Self {
        match payload {
            Value::Object(fields) => {
                let kind = fields
                    .get("type")
                    .and_then(Value::as_str)
                    .and_then(MessageKind::from_tag)
                    .unwrap_or_default();

                let content = CONTENT_FIELDS
                    .iter()
                    .filter_map(|name| fields.get(*name))
                    .find(|value| !is_blank(value))
                    .map_or_else(|| PLACEHOLDER.to_string(), render);

                Self { content, kind }
            }
            other if is_blank(other) => Self {
                content: PLACEHOLDER.to_string(),
                kind: MessageKind::default(),
            },
            other => Self {
                content: render(other),
                kind: MessageKind::default(),
            },
        }
    }
}

/// Canonical text form of a JSON value: strings verbatim, anything else
/// pretty-printed with a two space indent.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// Rebuild a `Message` from a pushed event body.
///
/// The body is normally a serialized `Message`, but producers have been seen
/// pushing raw payloads too; those keep zero id/timestamp and get their
/// content normalized like an ingested payload.
pub fn message_from_value(data: &Value) -> Message {
    let submission = Submission::from_payload(data);
    let id = data.get("id").and_then(Value::as_u64).unwrap_or(0);
    let timestamp = data.get("timestamp").and_then(Value::as_i64).unwrap_or(0);

    Message {
        id,
        timestamp,
        content: submission.content,
        kind: submission.kind,
    }
}

/// Values a producer sends when it has nothing to say: null, empty text,
/// `false` and zero.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        _ => false,
    }
}
