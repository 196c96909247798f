//! Relay engine
//!
//! This module contains the in-memory relay responsible for:
//! - stamping producer submissions into `Message`s
//! - keeping them in the bounded `MessageStore` for polling consumers
//! - broadcasting each new message to every live push connection
//!
//! Concurrency and usage notes:
//! - The relay is shared as `Arc<Relay>` and synchronizes internally. The
//!   ledger (store, clock, id sequence) and the connection set each sit behind
//!   their own mutex, held only for in-memory work and never across `.await`.
//! - Broadcast walks a snapshot of the connection set, so connects and
//!   disconnects during a broadcast cannot disturb it. Sends are pushes into
//!   unbounded channels; the socket writes happen in the transport's send
//!   loops.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, error, info};
use tungstenite::protocol::Message as WsMessage;

use crate::relay::connection::{Connection, ConnectionId};
use crate::relay::payload::Submission;
use crate::store::{Message, MessageStore, Page};
use crate::transport::message::PushEvent;

#[derive(Debug)]
struct Ledger {
    store: MessageStore,
    last_timestamp: i64,
    last_id: u64,
}

#[derive(Debug)]
pub struct Relay {
    ledger: Mutex<Ledger>,
    connections: Mutex<HashMap<ConnectionId, Connection>>,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(MessageStore::CAPACITY)
    }
}

impl Relay {
    pub fn new(capacity: usize) -> Self {
        Self {
            ledger: Mutex::new(Ledger {
                store: MessageStore::new(capacity),
                last_timestamp: 0,
                last_id: 0,
            }),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Accept a producer payload, store it and broadcast it.
    ///
    /// Never fails: unrecognized payloads are stored with placeholder content
    /// and resubmissions are not deduplicated.
    pub fn submit(&self, payload: &Value) -> Message {
        self.submit_at(payload, chrono::Utc::now().timestamp_millis())
    }

    /// Like `submit`, with an explicit clock reading in milliseconds.
    ///
    /// Timestamps are strictly increasing per relay: a reading at or below the
    /// previous timestamp is bumped to previous + 1, so a cursor equal to one
    /// message's timestamp can never hide a sibling with the same value.
    pub fn submit_at(&self, payload: &Value, now_ms: i64) -> Message {
        let Submission { content, kind } = Submission::from_payload(payload);

        let mut ledger = lock(&self.ledger);
        let timestamp = if now_ms > ledger.last_timestamp {
            now_ms
        } else {
            ledger.last_timestamp + 1
        };
        ledger.last_timestamp = timestamp;
        ledger.last_id += 1;

        let message = Message {
            id: ledger.last_id,
            timestamp,
            content,
            kind,
        };
        ledger.store.append(message.clone());

        // still under the ledger lock: push order matches timestamp order
        let delivered = self.broadcast(&message);
        drop(ledger);

        info!(
            id = message.id,
            timestamp = message.timestamp,
            delivered,
            "message submitted"
        );
        message
    }

    /// Messages newer than `since`; the polling contract.
    pub fn query(&self, since: i64) -> Page {
        lock(&self.ledger).store.query(since)
    }

    pub fn register(&self, connection: Connection) {
        debug!(id = %connection.id, "push connection registered");
        lock(&self.connections).insert(connection.id.clone(), connection);
    }

    /// Remove a connection. Returns whether it was still registered.
    pub fn remove(&self, id: &str) -> bool {
        let removed = lock(&self.connections).remove(id).is_some();
        if removed {
            debug!(id, "push connection removed");
        }
        removed
    }

    /// Drop every push connection. Their send loops close the sockets; the
    /// stored messages stay available.
    pub fn disconnect_all(&self) -> usize {
        let dropped: Vec<Connection> = lock(&self.connections).drain().map(|(_, c)| c).collect();
        if !dropped.is_empty() {
            info!(count = dropped.len(), "closing push connections");
        }
        dropped.len()
    }

    pub fn is_connected(&self, id: &str) -> bool {
        lock(&self.connections).contains_key(id)
    }

    pub fn connection_count(&self) -> usize {
        lock(&self.connections).len()
    }

    /// Number of messages currently retained.
    pub fn stored(&self) -> usize {
        lock(&self.ledger).store.len()
    }

    fn broadcast(&self, message: &Message) -> usize {
        let text = match serde_json::to_string(&PushEvent::message(message)) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize push event: {e}");
                return 0;
            }
        };
        let frame = WsMessage::text(text);

        let snapshot: Vec<Connection> = lock(&self.connections).values().cloned().collect();

        let mut delivered = 0;
        for connection in &snapshot {
            match connection.sender.send(frame.clone()) {
                Ok(()) => delivered += 1,
                // connection is tearing down; its cleanup removes it
                Err(_) => debug!(id = %connection.id, "dropped push to closing connection"),
            }
        }
        delivered
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
