//! Connectivity state and the bounded reconnection policy
//!
//! `Reconnector` is a plain state machine with no I/O and no timers. The push
//! client drives it from its connection loop; tests drive it directly.
//!
//! ```text
//! disconnected -> connecting -> connected
//! connected/connecting -> disconnected -> connecting   (attempts left)
//!                                      -> failed       (budget spent)
//! failed -> disconnected                               (external reset)
//! ```

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::config::ClientSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Reconnection budget exhausted; nothing happens until a reset.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnection attempts after a loss; the first connect is not counted.
    pub max_attempts: u32,
    /// Fixed wait before each attempt.
    pub delay: Duration,
}

impl ReconnectPolicy {
    pub const MAX_ATTEMPTS: u32 = 5;
    pub const DELAY: Duration = Duration::from_millis(1000);
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Self::MAX_ATTEMPTS,
            delay: Self::DELAY,
        }
    }
}

impl From<&ClientSettings> for ReconnectPolicy {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            max_attempts: settings.reconnect_attempts,
            delay: Duration::from_millis(settings.reconnect_delay_ms),
        }
    }
}

/// What to do after a connection was lost or could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Retry { attempt: u32, delay: Duration },
    GiveUp,
}

#[derive(Debug)]
pub struct Reconnector {
    policy: ReconnectPolicy,
    attempts: u32,
    state: ConnectionState,
}

impl Reconnector {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Reconnection attempts used since the last successful connection.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub fn connecting(&mut self) -> ConnectionState {
        self.state = ConnectionState::Connecting;
        self.state
    }

    /// A connection is up; the budget is restored.
    pub fn connected(&mut self) -> ConnectionState {
        self.attempts = 0;
        self.state = ConnectionState::Connected;
        self.state
    }

    /// The transport went away, or a connect attempt failed.
    pub fn lost(&mut self) -> ConnectionState {
        self.state = ConnectionState::Disconnected;
        self.state
    }

    /// Consume one attempt from the budget, or enter `Failed`.
    pub fn next_attempt(&mut self) -> Next {
        if self.attempts < self.policy.max_attempts {
            self.attempts += 1;
            Next::Retry {
                attempt: self.attempts,
                delay: self.policy.delay,
            }
        } else {
            self.state = ConnectionState::Failed;
            Next::GiveUp
        }
    }

    /// External instruction to start over with a full budget.
    pub fn reset(&mut self) -> ConnectionState {
        self.attempts = 0;
        self.state = ConnectionState::Disconnected;
        self.state
    }
}
