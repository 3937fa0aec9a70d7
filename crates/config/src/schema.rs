//! Config schema types (server, relay, inbound, sidecar).

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub use wabridge_protocol::defaults::{
    DEFAULT_CONNECT_ATTEMPTS, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAPS_BASE_URL,
    DEFAULT_RELAY_TIMEOUT_SECS, DEFAULT_SIDECAR_PORT,
};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WabridgeConfig {
    pub server: ServerConfig,
    pub relay: RelayConfig,
    pub inbound: InboundConfig,
    pub sidecar: SidecarConfig,
}

/// HTTP gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Bearer token required on `/api/*`. Unset means no auth.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_token: Option<Secret<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.into(),
            port: DEFAULT_PORT,
            api_token: None,
        }
    }
}

/// Webhook that receives normalized inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: DEFAULT_RELAY_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InboundConfig {
    /// Decorate group messages with the sender name.
    pub group_handling: bool,
    pub maps_base_url: String,
    /// Number of consumed events kept for `/api/message/last`.
    pub history_capacity: usize,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            group_handling: true,
            maps_base_url: DEFAULT_MAPS_BASE_URL.into(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// WhatsApp sidecar connection and, optionally, its process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SidecarConfig {
    /// Full WebSocket URL; overrides `port` when set.
    pub url: Option<String>,
    pub port: u16,
    /// Command that starts the sidecar. Empty means it is managed elsewhere.
    pub command: Vec<String>,
    pub dir: Option<PathBuf>,
    /// Open the WhatsApp session right after connecting to the sidecar.
    pub auto_connect: bool,
    pub connect_attempts: u32,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            url: None,
            port: DEFAULT_SIDECAR_PORT,
            command: Vec::new(),
            dir: None,
            auto_connect: false,
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
        }
    }
}

impl SidecarConfig {
    pub fn ws_url(&self) -> String {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("ws://127.0.0.1:{}", self.port),
        }
    }

    pub fn manages_process(&self) -> bool {
        !self.command.is_empty()
    }
}

impl ServerConfig {
    pub fn api_token(&self) -> Option<&str> {
        self.api_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.is_empty())
    }
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
