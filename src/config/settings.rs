use config::ConfigError;
use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server surfaces, the relay and the consumers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Settings {
    pub server: ServerSettings,
    pub relay: RelaySettings,
    pub client: ClientSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// `port` serves the WebSocket push channel, `http_port` the HTTP surface.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub http_port: u16,
}

/// Configuration settings for the relay.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RelaySettings {
    /// Number of messages retained for polling consumers.
    pub capacity: usize,
}

/// Configuration settings for the polling and push consumers.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ClientSettings {
    pub http_url: String,
    pub push_url: String,
    pub poll_interval_ms: u64,
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Settings where every field is optional. Missing values are filled from defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub relay: Option<PartialRelaySettings>,
    pub client: Option<PartialClientSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub http_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct PartialRelaySettings {
    pub capacity: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PartialClientSettings {
    pub http_url: Option<String>,
    pub push_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub reconnect_attempts: Option<u32>,
    pub reconnect_delay_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            http_url: "http://127.0.0.1:3000".to_string(),
            push_url: "ws://127.0.0.1:8080".to_string(),
            poll_interval_ms: 2000,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
                http_port: 3000,
            },
            relay: RelaySettings::default(),
            client: ClientSettings::default(),
            log: LogSettings::default(),
        }
    }
}

impl Settings {
    /// Reject values that would stall the relay or its consumers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.relay.capacity == 0 {
            return Err(ConfigError::Message(
                "relay.capacity must be at least 1".to_string(),
            ));
        }
        if self.client.poll_interval_ms == 0 {
            return Err(ConfigError::Message(
                "client.poll_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl PartialSettings {
    /// Fill every missing value from `default`.
    pub fn merge(self, default: Settings) -> Settings {
        let server = self.server;
        let relay = self.relay;
        let client = self.client;
        let log = self.log;

        Settings {
            server: ServerSettings {
                host: server
                    .as_ref()
                    .and_then(|s| s.host.clone())
                    .unwrap_or(default.server.host),
                port: server
                    .as_ref()
                    .and_then(|s| s.port)
                    .unwrap_or(default.server.port),
                http_port: server
                    .as_ref()
                    .and_then(|s| s.http_port)
                    .unwrap_or(default.server.http_port),
            },
            relay: RelaySettings {
                capacity: relay
                    .as_ref()
                    .and_then(|r| r.capacity)
                    .unwrap_or(default.relay.capacity),
            },
            client: ClientSettings {
                http_url: client
                    .as_ref()
                    .and_then(|c| c.http_url.clone())
                    .unwrap_or(default.client.http_url),
                push_url: client
                    .as_ref()
                    .and_then(|c| c.push_url.clone())
                    .unwrap_or(default.client.push_url),
                poll_interval_ms: client
                    .as_ref()
                    .and_then(|c| c.poll_interval_ms)
                    .unwrap_or(default.client.poll_interval_ms),
                reconnect_attempts: client
                    .as_ref()
                    .and_then(|c| c.reconnect_attempts)
                    .unwrap_or(default.client.reconnect_attempts),
                reconnect_delay_ms: client
                    .as_ref()
                    .and_then(|c| c.reconnect_delay_ms)
                    .unwrap_or(default.client.reconnect_delay_ms),
            },
            log: LogSettings {
                level: log
                    .and_then(|l| l.level)
                    .unwrap_or(default.log.level),
            },
        }
    }
}
