//! Relay core: turns inbound WhatsApp events into flat multipart webhook
//! posts, and outbound send requests into protocol messages.
//!
//! The [`Bridge`] owns the pieces and is what the gateway and the CLI talk
//! to. Everything below it is usable on its own for tests.

pub mod attachment;
pub mod bridge;
pub mod compose;
pub mod error;
pub mod history;
pub mod inbound;
pub mod message;
pub mod outbound;
pub mod recipient;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testing;

pub use {
    attachment::{MediaCategory, resolve_filename},
    bridge::{Bridge, BridgeOptions},
    compose::{ComposeOptions, Composed, compose},
    error::{Error, Result},
    history::EventHistory,
    inbound::Normalizer,
    message::{Attachment, CanonicalMessage},
    outbound::{OutboundComposer, SendRequest},
    recipient::parse_recipient,
    webhook::WebhookRelay,
};
