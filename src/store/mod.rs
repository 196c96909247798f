//! The `store` module holds the messages the relay has delivered so far.
//!
//! It is a bounded, volatile buffer: nothing survives a process restart and
//! the oldest message is evicted once `MessageStore::CAPACITY` is exceeded.
//! Polling consumers read from it through a timestamp cursor.

pub mod message;
pub mod message_store;

pub use message::{Message, MessageKind};
pub use message_store::{MessageStore, Page};

#[cfg(test)]
mod tests;
