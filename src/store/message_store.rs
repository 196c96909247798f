//! Bounded message buffer
//!
//! `MessageStore` keeps the most recent messages in append order. Appends
//! never fail: once the buffer holds more than its capacity the oldest
//! message is dropped. This is a memory bound, not an error, and callers must
//! expect history older than the last `capacity` messages to be gone.
//!
//! The store itself is not synchronized; the relay keeps it behind a mutex
//! and only touches it for in-memory work.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::message::Message;

/// Result of a cursor query.
///
/// `last_timestamp` is the timestamp of the newest returned message, or the
/// requested cursor when nothing matched, so a client can always adopt it as
/// its next cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub messages: Vec<Message>,
    pub last_timestamp: i64,
}

#[derive(Debug)]
pub struct MessageStore {
    messages: VecDeque<Message>,
    capacity: usize,
}

impl MessageStore {
    /// Default number of retained messages.
    pub const CAPACITY: usize = 100;

    /// A capacity of zero is raised to one so the newest message is always
    /// retained.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            messages: VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Append a message at the tail, evicting the oldest one if the store
    /// grew past its capacity.
    ///
    /// Messages must be appended in non-decreasing timestamp order; the relay
    /// guarantees this by stamping them under the same lock.
    pub fn append(&mut self, msg: Message) {
        self.messages.push_back(msg);
        if self.messages.len() > self.capacity {
            if let Some(evicted) = self.messages.pop_front() {
                debug!(
                    id = evicted.id,
                    timestamp = evicted.timestamp,
                    "store full, evicted oldest message"
                );
            }
        }
    }

    /// Messages strictly newer than `since`, oldest first.
    pub fn query(&self, since: i64) -> Page {
        // timestamps are ordered, so everything after the first match matches
        let start = self.messages.partition_point(|m| m.timestamp <= since);
        let messages: Vec<Message> = self.messages.range(start..).cloned().collect();
        let last_timestamp = messages.last().map_or(since, |m| m.timestamp);

        Page {
            messages,
            last_timestamp,
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new(Self::CAPACITY)
    }
}
