//! The `transport` module is responsible for network communication with
//! producers and consumers.
//!
//! It defines the wire types, the HTTP surface used for ingestion and
//! polling, and the WebSocket server that carries push broadcasts.

pub mod http;
pub mod message;
pub mod websocket;

pub use http::{AppState, build_router, start_http_server};
pub use websocket::{serve_websocket, start_websocket_server};

#[cfg(test)]
mod tests;
#[cfg(test)]
mod websocket_tests;
