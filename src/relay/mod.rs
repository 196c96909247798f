//! relay
//!
//! The relay crate module contains the single authoritative relay: ingestion
//! of producer payloads, the polling query, and the push connection set with
//! best-effort broadcast.
//!
//! Public types:
//! - `Relay`: core engine to submit, query and broadcast messages.
//! - `RelayRegistry`: idempotent per-process handle to the relay.
//! - `Connection`: a registered push consumer.

pub mod connection;
pub mod engine;
pub mod payload;
pub mod registry;

pub use connection::{Connection, ConnectionId};
pub use engine::Relay;
pub use registry::RelayRegistry;
