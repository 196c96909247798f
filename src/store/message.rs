//! Message definitions for the relay
//!
//! `Message` is the canonical wire/internal representation shared by the
//! polling and push paths.
//!
//! Notes on fields:
//! - `id`: sequence number assigned by the relay; for display and keying only
//! - `timestamp`: milliseconds since UNIX epoch; the ordering and cursor key,
//!   strictly increasing within one relay
//! - `content`: text; structured producer content is rendered to text before
//!   it ever reaches a `Message`
//! - `kind`: presentation tag, serialized as `type`

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Ai,
    User,
}

impl MessageKind {
    /// Parse a producer supplied tag. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ai" => Some(MessageKind::Ai),
            "user" => Some(MessageKind::User),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub timestamp: i64,
    pub content: String,
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
}
