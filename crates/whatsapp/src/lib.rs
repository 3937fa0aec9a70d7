//! WhatsApp Web client adapter.
//!
//! The WhatsApp session lives in a Node.js sidecar process. This crate
//! speaks its JSON-over-WebSocket protocol and exposes it as a
//! [`wabridge_protocol::MessagingClient`]; it can also supervise the
//! sidecar process itself.

pub mod process;
pub mod sidecar;
pub mod types;

pub use {
    process::{SidecarConfig, SidecarProcess, start_sidecar},
    sidecar::SidecarClient,
};
