//! WebSocket transport
//!
//! This file implements the push side of the relay. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Create a `Connection` for each socket and register it with the `Relay`
//! - Forward broadcast frames from the connection's channel to the socket
//! - Remove the connection exactly once when either direction ends
//!
//! Consumers only listen; inbound frames other than close are ignored.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::config::RelaySettings;
use crate::relay::{Connection, Relay, RelayRegistry};
use crate::utils::RelayError;

pub async fn start_websocket_server(
    addr: &str,
    registry: Arc<RelayRegistry>,
    settings: RelaySettings,
) -> Result<(), RelayError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| RelayError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("WebSocket server listening on ws://{addr}");

    serve_websocket(listener, registry, settings).await
}

/// Accept loop over an already bound listener.
pub async fn serve_websocket(
    listener: TcpListener,
    registry: Arc<RelayRegistry>,
    settings: RelaySettings,
) -> Result<(), RelayError> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        let relay = registry.relay(&settings);
        spawn(handle_connection(stream, peer, relay));
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, relay: Arc<Relay>) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<WsMessage>();
    let connection = Connection::new(tx);
    let connection_id = connection.id.clone();
    relay.register(connection);
    info!(id = %connection_id, %peer, "push client connected");

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let relay = relay.clone();
        let connection_id = connection_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                relay.remove(&connection_id);
                info!(id = %connection_id, "push client disconnected");
            }
        }
    };

    {
        let connection_id = connection_id.clone();
        let do_cleanup = do_cleanup.clone();

        // ends once the relay drops the sender or the socket refuses a write
        spawn(async move {
            while let Some(msg) = rx.recv().await {
                if let Err(e) = ws_sender.send(msg).await {
                    debug!(id = %connection_id, "Failed to send message: {e}");
                    break;
                }
            }

            do_cleanup();
            let _ = ws_sender.close().await;
        });
    }

    while let Some(frame) = ws_receiver.next().await {
        match frame {
            Ok(WsMessage::Close(_)) => break,
            Ok(msg) if msg.is_text() || msg.is_binary() => {
                debug!(id = %connection_id, "ignoring inbound frame");
            }
            Ok(_) => {}
            Err(e) => {
                debug!(id = %connection_id, "read error: {e}");
                break;
            }
        }
    }

    do_cleanup();
}
