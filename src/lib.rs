//! # hookrelay
//!
//! `hookrelay` relays short text messages from a webhook-driven producer to
//! interactive clients in near-real-time. Producers post JSON to an HTTP
//! endpoint; consumers either poll with a timestamp cursor or hold a
//! WebSocket open and receive every message as it is submitted.
//!
//! ## Core Modules
//!
//! - `store`: the bounded, timestamp-ordered message buffer.
//! - `relay`: the per-process relay: ingestion, polling query, push connection set.
//! - `transport`: the HTTP surface and the WebSocket push server.
//! - `client`: polling and push consumers, including the reconnection policy.
//! - `config`: loading and merging server, relay and client configuration.
//! - `utils`: error types and logging setup.

pub mod client;
pub mod config;
pub mod relay;
pub mod store;
pub mod transport;
pub mod utils;
