//! HTTP surface of the bridge.
//!
//! - `GET /health`: liveness plus WhatsApp connection state
//! - `POST /api/message/send`: compose and send one message
//! - `GET /api/message/last`: most recent inbound event
//!
//! `/api/*` routes require `Authorization: Bearer <token>` when an API
//! token is configured.

pub mod auth_middleware;
pub mod message_routes;
pub mod server;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    server::{AppState, build_gateway_app, start_gateway},
    state::GatewayState,
};
