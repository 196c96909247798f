//! The `client` module contains the two consumer strategies for the relay.
//!
//! - `PollingClient` pulls `GET /messages?since=` on a fixed interval.
//! - `PushClient` holds a WebSocket open and reconnects on loss with a bounded
//!   budget, driven by the `Reconnector` state machine.
//!
//! Both deliver `Message`s through a callback and publish their
//! `ConnectionState` on a watch channel.

pub mod polling;
pub mod push;
pub mod reconnect;

pub use polling::{HttpSource, MessageSource, PollingClient};
pub use push::{PushClient, PushHandle, PushTransport, WsTransport};
pub use reconnect::{ConnectionState, ReconnectPolicy, Reconnector};
