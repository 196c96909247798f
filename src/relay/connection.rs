//! Push connection representation
//!
//! `Connection` models one live WebSocket consumer and holds the sending side
//! of its per-connection channel. The relay pushes frames into the channel and
//! the transport's send loop drains it into the socket.

use tokio::sync::mpsc::UnboundedSender;
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

pub type ConnectionId = String;

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub sender: UnboundedSender<WsMessage>,
}

impl Connection {
    /// Create a new connection with a sender channel. The `id` is a UUID used
    /// to remove the connection again on disconnect.
    pub fn new(sender: UnboundedSender<WsMessage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender,
        }
    }
}
