//! Wire types shared by the HTTP surface, the WebSocket push channel and the
//! consumers that read them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::Message;

/// Name of the event carrying a relayed message on the push channel.
pub const MESSAGE_EVENT: &str = "n8n-message";

/// Outbound push frame: `{"event": "n8n-message", "data": {...}}`.
#[derive(Debug, Serialize)]
pub struct PushEvent<'a> {
    pub event: &'static str,
    pub data: &'a Message,
}

impl<'a> PushEvent<'a> {
    pub fn message(data: &'a Message) -> Self {
        Self {
            event: MESSAGE_EVENT,
            data,
        }
    }
}

/// Inbound push frame as seen by a consumer. `data` is left untyped because
/// producers do not keep to one schema.
#[derive(Debug, Deserialize)]
pub struct IncomingEvent {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EmitResponse {
    pub status: String,
    pub message: String,
    pub data: Message,
}

impl EmitResponse {
    pub fn stored(data: Message) -> Self {
        Self {
            status: "success".to_string(),
            message: "Message stored successfully".to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiateResponse {
    pub status: String,
    pub push_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
    pub messages: usize,
}
