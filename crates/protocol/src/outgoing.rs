use serde::{Deserialize, Serialize};

use crate::message::{AudioMessage, DocumentMessage, ImageMessage, Message, VideoMessage};

/// A message to send; exactly one content variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutboundMessage {
    Text { conversation: String },
    Image(ImageMessage),
    Video(VideoMessage),
    Audio(AudioMessage),
    Document(DocumentMessage),
}

impl OutboundMessage {
    pub fn text(conversation: impl Into<String>) -> Self {
        Self::Text {
            conversation: conversation.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image(_) => "image",
            Self::Video(_) => "video",
            Self::Audio(_) => "audio",
            Self::Document(_) => "document",
        }
    }

    /// Wire form with a single populated variant.
    pub fn to_message(&self) -> Message {
        let mut message = Message::default();
        match self.clone() {
            Self::Text { conversation } => message.conversation = Some(conversation),
            Self::Image(image) => message.image_message = Some(image),
            Self::Video(video) => message.video_message = Some(video),
            Self::Audio(audio) => message.audio_message = Some(audio),
            Self::Document(document) => message.document_message = Some(document),
        }
        message
    }
}
