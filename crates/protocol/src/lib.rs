//! WhatsApp message model shared between the relay core and the client adapter.
//!
//! The types mirror the JSON shape the sidecar emits for the WhatsApp
//! protobuf messages (camelCase keys, every sub-field optional). The relay
//! core only reads them; the sidecar owns their lifecycle.
//!
//! - [`MessageEvent`]: one inbound message with its envelope
//! - [`Message`]: the union of content variants
//! - [`OutboundMessage`]: exactly one outgoing content variant
//! - [`MessagingClient`]: what the core needs from the external client

pub mod client;
pub mod defaults;
pub mod error;
pub mod jid;
pub mod media;
pub mod message;
pub mod outgoing;

pub use {
    client::{ClientEvent, MessagingClient, SendReceipt, SharedClient},
    defaults::{
        DEFAULT_CONNECT_ATTEMPTS, DEFAULT_HISTORY_CAPACITY, DEFAULT_MAPS_BASE_URL,
        DEFAULT_RELAY_TIMEOUT_SECS, DEFAULT_SIDECAR_PORT,
    },
    error::{Error, Result},
    jid::{DEFAULT_USER_SERVER, GROUP_SERVER, Jid},
    media::{MediaRef, MediaType, UploadResponse},
    message::{
        AudioMessage, ContactMessage, ContextInfo, DocumentMessage, ExtendedTextMessage,
        ImageMessage, LocationMessage, Message, MessageEvent, MessageInfo, MessageKey,
        ProductMessage, ProductSnapshot, ReactionMessage, StickerMessage, VideoMessage,
    },
    outgoing::OutboundMessage,
};
