//! Process-wide relay handle
//!
//! Every entry point (HTTP handlers, the WebSocket server, the CLI) asks the
//! registry for the relay instead of constructing one. The first call creates
//! it; later calls, including racing ones, get the same instance and with it
//! the same connection set. Two relays in one process would split traffic
//! between disjoint sets of push consumers.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::config::RelaySettings;
use crate::relay::engine::Relay;

#[derive(Debug, Default)]
pub struct RelayRegistry {
    slot: OnceLock<Arc<Relay>>,
}

impl RelayRegistry {
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Return the relay, creating it from `settings` on first use.
    ///
    /// Settings passed after the first call are ignored.
    pub fn relay(&self, settings: &RelaySettings) -> Arc<Relay> {
        self.slot
            .get_or_init(|| {
                info!(capacity = settings.capacity, "initializing relay");
                Arc::new(Relay::new(settings.capacity))
            })
            .clone()
    }

    /// The relay, if some entry point already initialized it.
    pub fn get(&self) -> Option<Arc<Relay>> {
        self.slot.get().cloned()
    }
}
