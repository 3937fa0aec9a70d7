use std::sync::Arc;

use {
    secrecy::{ExposeSecret, Secret},
    wabridge_relay::Bridge,
};

/// Shared state behind every route.
pub struct GatewayState {
    pub bridge: Arc<Bridge>,
    api_token: Option<Secret<String>>,
    pub version: String,
}

impl GatewayState {
    pub fn new(bridge: Arc<Bridge>, api_token: Option<Secret<String>>) -> Arc<Self> {
        Arc::new(Self {
            bridge,
            api_token: api_token.filter(|t| !t.expose_secret().is_empty()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn auth_enabled(&self) -> bool {
        self.api_token.is_some()
    }

    /// `true` when no token is configured or `presented` matches it.
    pub fn verify_token(&self, presented: Option<&str>) -> bool {
        match (&self.api_token, presented) {
            (None, _) => true,
            (Some(expected), Some(presented)) => {
                constant_time_eq(expected.expose_secret().as_bytes(), presented.as_bytes())
            },
            (Some(_), None) => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
