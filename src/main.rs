//! CLI for hookrelay
//!
//! Subcommands:
//! - `server`: run the HTTP surface and the WebSocket push server
//! - `poll`: print messages received by cursor polling
//! - `listen`: print messages received on the push channel
//! - `emit`: post one message as a producer would (useful for smoke tests)

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use hookrelay::client::{HttpSource, PollingClient, PushClient, ReconnectPolicy, WsTransport};
use hookrelay::config::{LogSettings, Settings, load_config};
use hookrelay::relay::RelayRegistry;
use hookrelay::store::Message;
use hookrelay::transport::message::EmitResponse;
use hookrelay::transport::{AppState, start_http_server, start_websocket_server};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hookrelay")]
enum Command {
    /// Start the HTTP and WebSocket servers
    Server,
    /// Poll the relay over HTTP and print every new message
    Poll {
        /// Relay base URL (default: client.http_url from configuration)
        #[arg(long)]
        url: Option<String>,
    },
    /// Listen on the push channel and print every message
    Listen {
        /// WebSocket URL (default: client.push_url from configuration)
        #[arg(long)]
        url: Option<String>,
    },
    /// Submit a message to the relay
    Emit {
        /// Message text
        #[arg(long)]
        message: String,
        /// Presentation tag, `ai` or `user`
        #[arg(long, default_value = "ai")]
        kind: String,
        /// Relay base URL (default: client.http_url from configuration)
        #[arg(long)]
        url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cmd = Command::parse();

    let settings = match load_config() {
        Ok(settings) => settings,
        Err(e) => {
            hookrelay::utils::logging::init(&LogSettings::default());
            error!("Failed to load configuration: {}", e);
            return;
        }
    };
    hookrelay::utils::logging::init(&settings.log);

    let result = match cmd {
        Command::Server => run_server(settings).await,
        Command::Poll { url } => run_poll(settings, url).await,
        Command::Listen { url } => run_listen(settings, url).await,
        Command::Emit { message, kind, url } => run_emit(settings, url, message, kind).await,
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}

async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let host = settings.server.host.clone();
    let ws_addr = format!("{}:{}", host, settings.server.port);
    let http_addr = format!("{}:{}", host, settings.server.http_port);

    let registry = Arc::new(RelayRegistry::new());
    registry.relay(&settings.relay);

    let state = AppState {
        registry: registry.clone(),
        relay_settings: settings.relay.clone(),
        push_url: format!("ws://{ws_addr}"),
    };

    tokio::select! {
        result = start_http_server(&http_addr, state) => {
            result?;
            error!("HTTP server exited unexpectedly.");
        }
        result = start_websocket_server(&ws_addr, registry.clone(), settings.relay.clone()) => {
            result?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    if let Some(relay) = registry.get() {
        relay.disconnect_all();
    }

    Ok(())
}

async fn run_poll(settings: Settings, url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let url = url.unwrap_or(settings.client.http_url);
    let client = PollingClient::new(HttpSource::new(&url))
        .with_interval(Duration::from_millis(settings.client.poll_interval_ms));

    let cancel = CancellationToken::new();
    let stop = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        stop.cancel();
    });

    info!("Polling {url}");
    let cursor = client.run(print_message, cancel).await;
    info!(cursor, "Polling stopped");
    Ok(())
}

async fn run_listen(settings: Settings, url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let url = url.unwrap_or_else(|| settings.client.push_url.clone());
    let policy = ReconnectPolicy::from(&settings.client);

    info!("Listening on {url}");
    let handle = PushClient::spawn(WsTransport::new(url), policy, print_message);
    let mut state = handle.state();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                info!(state = %*state.borrow(), "push connection state changed");
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn run_emit(
    settings: Settings,
    url: Option<String>,
    message: String,
    kind: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = url.unwrap_or(settings.client.http_url);
    let endpoint = format!("{}/emit", url.trim_end_matches('/'));

    let response = reqwest::Client::new()
        .post(&endpoint)
        .json(&json!({ "message": message, "type": kind }))
        .send()
        .await?
        .error_for_status()?
        .json::<EmitResponse>()
        .await?;

    println!(
        "{}: id={} timestamp={}",
        response.status, response.data.id, response.data.timestamp
    );
    Ok(())
}

fn print_message(message: Message) {
    println!("[{}] {:?}: {}", message.timestamp, message.kind, message.content);
}
