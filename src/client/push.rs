//! Push consumer
//!
//! `PushClient` keeps a connection to the relay's push channel open and
//! invokes the callback once per received message, in transport order. When
//! the connection drops it reconnects according to its `ReconnectPolicy`;
//! once the budget is spent it parks in `Failed` until the owner calls
//! `PushHandle::reconnect`. `PushHandle::stop` ends the task at any point,
//! including in the middle of a reconnect delay.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::client::reconnect::{ConnectionState, Next, ReconnectPolicy, Reconnector};
use crate::relay::payload::message_from_value;
use crate::store::Message;
use crate::transport::message::{IncomingEvent, MESSAGE_EVENT};
use crate::utils::ClientError;

/// Text frames of one push session. The stream ending means the transport
/// was lost.
pub type FrameStream = BoxStream<'static, Result<String, ClientError>>;

pub trait PushTransport: Send + Sync + 'static {
    fn connect(&self) -> impl Future<Output = Result<FrameStream, ClientError>> + Send;
}

/// WebSocket connection to the relay's push server.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: String,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl PushTransport for WsTransport {
    async fn connect(&self) -> Result<FrameStream, ClientError> {
        let (ws_stream, _response) = connect_async(self.url.as_str()).await?;

        let frames = ws_stream.filter_map(|frame| async move {
            match frame {
                Ok(WsMessage::Text(text)) => Some(Ok(text.as_str().to_owned())),
                Ok(_) => None,
                Err(e) => Some(Err(ClientError::from(e))),
            }
        });
        Ok(frames.boxed())
    }
}

/// Decode one push frame. Frames that are not message events yield `None`.
pub fn decode_event(text: &str) -> Option<Message> {
    let event: IncomingEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            debug!("ignoring non-event frame: {e}");
            return None;
        }
    };

    if event.event != MESSAGE_EVENT {
        debug!(event = %event.event, "ignoring event");
        return None;
    }
    Some(message_from_value(&event.data))
}

/// Owner's side of a running `PushClient`.
///
/// Dropping the handle stops the client, like `stop`.
#[derive(Debug)]
pub struct PushHandle {
    state: watch::Receiver<ConnectionState>,
    reconnect: Arc<Notify>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    _stop_on_drop: DropGuard,
}

impl PushHandle {
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Restart after the budget was exhausted. No effect in any other state.
    pub fn reconnect(&self) {
        self.reconnect.notify_waiters();
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop the client and wait for its task to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!("push client task failed: {e}");
        }
    }
}

enum SessionEnd {
    Lost,
    Stopped,
}

pub struct PushClient<T, F> {
    transport: T,
    on_message: F,
    reconnector: Reconnector,
    state: watch::Sender<ConnectionState>,
    reconnect: Arc<Notify>,
    cancel: CancellationToken,
}

impl<T, F> PushClient<T, F>
where
    T: PushTransport,
    F: FnMut(Message) + Send + 'static,
{
    /// Start connecting right away on a background task.
    pub fn spawn(transport: T, policy: ReconnectPolicy, on_message: F) -> PushHandle {
        let (state, state_rx) = watch::channel(ConnectionState::Disconnected);
        let reconnect = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let client = Self {
            transport,
            on_message,
            reconnector: Reconnector::new(policy),
            state,
            reconnect: reconnect.clone(),
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(client.run());

        PushHandle {
            state: state_rx,
            reconnect,
            _stop_on_drop: cancel.clone().drop_guard(),
            cancel,
            task,
        }
    }

    async fn run(mut self) {
        loop {
            let state = self.reconnector.connecting();
            self.publish(state);

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => break,
                result = self.transport.connect() => result,
            };

            match connected {
                Ok(frames) => {
                    let state = self.reconnector.connected();
                    self.publish(state);
                    info!("push channel connected");

                    if let SessionEnd::Stopped =
                        pump(frames, &mut self.on_message, &self.cancel).await
                    {
                        break;
                    }
                    warn!("push channel lost");
                }
                Err(e) => warn!("push connection failed: {e}"),
            }

            let state = self.reconnector.lost();
            self.publish(state);

            match self.reconnector.next_attempt() {
                Next::Retry { attempt, delay } => {
                    info!(
                        attempt,
                        max_attempts = self.reconnector.policy().max_attempts,
                        "reconnecting in {delay:?}"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Next::GiveUp => {
                    // register interest before announcing Failed so a
                    // reconnect issued right after the announcement counts
                    let notified = self.reconnect.notified();
                    tokio::pin!(notified);
                    notified.as_mut().enable();

                    self.publish(self.reconnector.state());
                    error!(
                        "push channel failed after {} reconnection attempts",
                        self.reconnector.policy().max_attempts
                    );

                    tokio::select! {
                        _ = self.cancel.cancelled() => break,
                        _ = &mut notified => {
                            let state = self.reconnector.reset();
                            self.publish(state);
                            info!("reconnect requested");
                        }
                    }
                }
            }
        }

        let state = self.reconnector.lost();
        self.publish(state);
        debug!("push client stopped");
    }

    fn publish(&self, state: ConnectionState) {
        debug!(%state, "push connection state");
        self.state.send_replace(state);
    }
}

async fn pump<F>(mut frames: FrameStream, on_message: &mut F, cancel: &CancellationToken) -> SessionEnd
where
    F: FnMut(Message),
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return SessionEnd::Stopped,
            frame = frames.next() => frame,
        };

        match frame {
            Some(Ok(text)) => {
                if let Some(message) = decode_event(&text) {
                    on_message(message);
                }
            }
            Some(Err(e)) => {
                warn!("push channel error: {e}");
                return SessionEnd::Lost;
            }
            None => return SessionEnd::Lost,
        }
    }
}
