use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::config::RelaySettings;
use crate::relay::{Relay, RelayRegistry};
use crate::transport::serve_websocket;

async fn setup_server() -> (String, Arc<RelayRegistry>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let registry = Arc::new(RelayRegistry::new());

    tokio::spawn(serve_websocket(
        listener,
        registry.clone(),
        RelaySettings::default(),
    ));

    (url, registry)
}

async fn wait_for_connections(relay: &Relay, expected: usize) {
    for _ in 0..200 {
        if relay.connection_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {expected} connections, have {}",
        relay.connection_count()
    );
}

#[tokio::test]
async fn test_broadcast_reaches_connected_clients() {
    let (url, registry) = setup_server().await;
    let (mut ws_a, _) = connect_async(url.as_str()).await.expect("client A connect");
    let (mut ws_b, _) = connect_async(url.as_str()).await.expect("client B connect");

    let relay = registry.relay(&RelaySettings::default());
    wait_for_connections(&relay, 2).await;

    let message = relay.submit(&json!({ "message": "hello world" }));

    for ws in [&mut ws_a, &mut ws_b] {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for broadcast")
            .expect("stream ended")
            .expect("read error");
        let parsed: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
        assert_eq!(parsed["event"], "n8n-message");
        assert_eq!(parsed["data"]["content"], "hello world");
        assert_eq!(parsed["data"]["id"], message.id);
    }
}

#[tokio::test]
async fn test_disconnect_removes_connection() {
    let (url, registry) = setup_server().await;
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

    let relay = registry.relay(&RelaySettings::default());
    wait_for_connections(&relay, 1).await;

    ws.close(None).await.expect("Failed to close WebSocket");
    wait_for_connections(&relay, 0).await;

    // the relay keeps serving after a client left
    relay.submit(&json!("nobody listening"));
    assert_eq!(relay.stored(), 1);
}

#[tokio::test]
async fn test_inbound_frames_are_ignored() {
    let (url, registry) = setup_server().await;
    let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

    ws.send(WsMessage::Text("not a command".into()))
        .await
        .expect("send");

    let relay = registry.relay(&RelaySettings::default());
    wait_for_connections(&relay, 1).await;
    assert_eq!(relay.stored(), 0);
}
