//! Defaults shared by the runtime crates and the config schema.

/// WebSocket port of the sidecar process.
pub const DEFAULT_SIDECAR_PORT: u16 = 7778;

/// Connection attempts made while the sidecar is starting.
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 10;

pub const DEFAULT_RELAY_TIMEOUT_SECS: u64 = 10;

/// Base of the map links composed for locations.
pub const DEFAULT_MAPS_BASE_URL: &str = "https://maps.google.com";

/// Inbound events kept for `/api/message/last`.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;
