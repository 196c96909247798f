//! Pull-based consumer
//!
//! `PollingClient` asks a `MessageSource` for everything newer than its
//! cursor, hands each message to the callback in order and then moves the
//! cursor to the returned `last_timestamp`. A failed fetch leaves the cursor
//! where it was, so the next successful tick picks up the same messages.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::reconnect::ConnectionState;
use crate::relay::Relay;
use crate::store::{Message, Page};
use crate::utils::ClientError;

/// Anything that answers the polling query.
pub trait MessageSource {
    fn fetch(&self, since: i64) -> impl Future<Output = Result<Page, ClientError>> + Send;
}

/// Polls the relay's HTTP surface.
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: reqwest::Client,
    messages_url: String,
}

impl HttpSource {
    /// `base_url` is the relay root, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            messages_url: format!("{}/messages", base_url.trim_end_matches('/')),
        }
    }
}

impl MessageSource for HttpSource {
    async fn fetch(&self, since: i64) -> Result<Page, ClientError> {
        let response = self
            .http
            .get(&self.messages_url)
            .query(&[("since", since)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(response.json::<Page>().await?)
    }
}

/// In-process polling, bypassing HTTP.
impl MessageSource for Arc<Relay> {
    async fn fetch(&self, since: i64) -> Result<Page, ClientError> {
        Ok(self.query(since))
    }
}

#[derive(Debug)]
pub struct PollingClient<S> {
    source: S,
    cursor: i64,
    interval: Duration,
    state: watch::Sender<ConnectionState>,
}

impl<S: MessageSource> PollingClient<S> {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            source,
            cursor: 0,
            interval: Self::DEFAULT_INTERVAL,
            state,
        }
    }

    /// Set the poll period. A zero period is refused and the current one kept.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        if interval.is_zero() {
            warn!("ignoring zero poll interval, keeping {:?}", self.interval);
        } else {
            self.interval = interval;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start from a cursor other than 0, e.g. one returned by an earlier `run`.
    pub fn with_cursor(mut self, cursor: i64) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// One poll. Returns how many messages were delivered.
    pub async fn tick<F>(&mut self, on_message: &mut F) -> Result<usize, ClientError>
    where
        F: FnMut(Message),
    {
        let page = match self.source.fetch(self.cursor).await {
            Ok(page) => page,
            Err(e) => {
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let delivered = page.messages.len();
        for message in page.messages {
            on_message(message);
        }
        self.cursor = self.cursor.max(page.last_timestamp);
        self.state.send_replace(ConnectionState::Connected);

        if delivered > 0 {
            debug!(delivered, cursor = self.cursor, "polled new messages");
        }
        Ok(delivered)
    }

    /// Poll immediately, then once per interval, until `cancel` fires.
    /// Returns the final cursor.
    pub async fn run<F>(mut self, mut on_message: F, cancel: CancellationToken) -> i64
    where
        F: FnMut(Message),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                result = self.tick(&mut on_message) => {
                    if let Err(e) = result {
                        warn!("Error polling for messages: {e}");
                    }
                }
            }
        }

        self.cursor
    }
}
