//! Wire frames exchanged with the sidecar.
//!
//! Every frame is a JSON object tagged by `type`. Requests carry a
//! `request_id` that the sidecar echoes back in its `response` frame.
//! Binary payloads travel as standard base64.

use {
    serde::{Deserialize, Serialize},
    wabridge_protocol::{Jid, MediaType, Message, MessageEvent},
};

/// Frames sent from the bridge to the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GatewayMessage {
    /// Open (or resume) the stored WhatsApp session.
    Connect { request_id: String },
    Disconnect { request_id: String },
    /// Fetch and decrypt the media referenced by `message`.
    Download {
        request_id: String,
        message: Box<Message>,
    },
    Upload {
        request_id: String,
        media_type: MediaType,
        data: String,
    },
    Send {
        request_id: String,
        to: Jid,
        message: Box<Message>,
    },
}

impl GatewayMessage {
    pub fn request_id(&self) -> &str {
        match self {
            Self::Connect { request_id }
            | Self::Disconnect { request_id }
            | Self::Download { request_id, .. }
            | Self::Upload { request_id, .. }
            | Self::Send { request_id, .. } => request_id,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
            Self::Download { .. } => "download",
            Self::Upload { .. } => "upload",
            Self::Send { .. } => "send",
        }
    }
}

/// Frames pushed by the sidecar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SidecarMessage {
    Message {
        event: Box<MessageEvent>,
    },
    Connected {
        #[serde(default)]
        phone_number: Option<String>,
    },
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    LoggedOut,
    Response(ResponseFrame),
}

/// Outcome of one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResponseFrame {
    pub request_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
}

/// `result` of a successful download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadResult {
    pub data: String,
}

/// Connection state as seen from the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected {
        phone_number: Option<String>,
    },
    LoggedOut,
}
