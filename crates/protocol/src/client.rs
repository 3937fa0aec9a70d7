//! The boundary between the relay core and whatever talks to WhatsApp.

use std::sync::Arc;

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::{
    error::Result,
    jid::Jid,
    media::{MediaType, UploadResponse},
    message::{Message, MessageEvent},
    outgoing::OutboundMessage,
};

/// Server acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

/// Events pushed by the client, delivered in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    Message(Box<MessageEvent>),
    Connected { phone_number: Option<String> },
    Disconnected { reason: String },
    LoggedOut,
}

/// Operations the relay needs from a WhatsApp session.
///
/// Implementations own the pairing, encryption and reconnection logic.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    async fn connect(&self) -> Result<()>;

    async fn disconnect(&self) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Fetch and decrypt the media referenced by whichever variant is set.
    async fn download_any(&self, message: &Message) -> Result<Vec<u8>>;

    async fn upload(&self, data: Vec<u8>, media_type: MediaType) -> Result<UploadResponse>;

    async fn send_message(&self, to: &Jid, message: &OutboundMessage) -> Result<SendReceipt>;
}

pub type SharedClient = Arc<dyn MessagingClient>;
