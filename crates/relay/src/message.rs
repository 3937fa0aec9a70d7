//! Flat records handed to the webhook relay.

use serde::Serialize;

/// An inbound event flattened and decorated for the relay endpoint.
///
/// `conversation` is display-ready; receivers never look at the raw event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CanonicalMessage {
    #[serde(rename = "ID")]
    pub id: String,
    pub chat: String,
    pub caption: String,
    pub sender: String,
    pub sender_name: String,
    pub is_from_me: bool,
    pub is_group: bool,
    pub is_ephemeral: bool,
    pub is_view_once: bool,
    pub timestamp: String,
    pub media_type: String,
    pub multicast: bool,
    pub conversation: String,
}

impl CanonicalMessage {
    /// Multipart field names and values, in wire order.
    pub fn fields(&self) -> [(&'static str, String); 13] {
        [
            ("ID", self.id.clone()),
            ("Chat", self.chat.clone()),
            ("Caption", self.caption.clone()),
            ("Sender", self.sender.clone()),
            ("SenderName", self.sender_name.clone()),
            ("IsFromMe", self.is_from_me.to_string()),
            ("IsGroup", self.is_group.to_string()),
            ("IsEphemeral", self.is_ephemeral.to_string()),
            ("IsViewOnce", self.is_view_once.to_string()),
            ("Timestamp", self.timestamp.clone()),
            ("MediaType", self.media_type.clone()),
            ("Multicast", self.multicast.to_string()),
            ("Conversation", self.conversation.clone()),
        ]
    }
}

/// Downloaded media plus the filename it is relayed under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachment {
    pub data: Option<Vec<u8>>,
    pub filename: String,
}

impl Attachment {
    pub fn new(data: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            filename: filename.into(),
        }
    }

    /// Empty attachments are never sent as a file part.
    pub fn is_empty(&self) -> bool {
        self.filename.is_empty() || self.data.as_ref().is_none_or(Vec::is_empty)
    }
}
