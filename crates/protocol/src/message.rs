//! Inbound message events and the content-variant union.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

use crate::{jid::Jid, media::MediaRef};

/// One message delivered by the client, with its envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    pub info: MessageInfo,
    #[serde(default)]
    pub message: Message,
    #[serde(default)]
    pub is_ephemeral: bool,
    #[serde(default)]
    pub is_view_once: bool,
}

/// Envelope metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageInfo {
    pub id: String,
    pub chat: Jid,
    pub sender: Jid,
    #[serde(default)]
    pub push_name: String,
    #[serde(default)]
    pub is_from_me: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
    /// Declared media category (`image`, `ptt`, `vcard`, ...); empty for text.
    #[serde(default)]
    pub media_type: String,
    #[serde(default)]
    pub multicast: bool,
}

/// The content variants of a WhatsApp message.
///
/// Several variants can be present at once (a location reply carries both
/// a location and a context), so this is a struct of options rather than an
/// enum.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_text_message: Option<ExtendedTextMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_message: Option<ImageMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_message: Option<VideoMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_message: Option<AudioMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_message: Option<DocumentMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sticker_message: Option<StickerMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_message: Option<ContactMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_message: Option<LocationMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction_message: Option<ReactionMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_message: Option<ProductMessage>,
}

impl Message {
    /// Plain conversation text, falling back to the extended text body.
    pub fn text(&self) -> &str {
        match self.conversation.as_deref() {
            Some(text) if !text.is_empty() => text,
            _ => self
                .extended_text_message
                .as_ref()
                .and_then(|m| m.text.as_deref())
                .unwrap_or_default(),
        }
    }

    /// Caption of an image or video; the video caption wins when both exist.
    pub fn media_caption(&self) -> &str {
        let video = self.video_message.as_ref().and_then(|m| m.caption.as_deref());
        let image = self.image_message.as_ref().and_then(|m| m.caption.as_deref());
        video.or(image).unwrap_or_default()
    }

    /// The reply/forward context, from whichever variant carries one.
    pub fn context_info(&self) -> Option<&ContextInfo> {
        self.extended_text_message
            .as_ref()
            .and_then(|m| m.context_info.as_ref())
            .or_else(|| self.image_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.video_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.audio_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.document_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.sticker_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.contact_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.location_message.as_ref()?.context_info.as_ref())
            .or_else(|| self.product_message.as_ref()?.context_info.as_ref())
    }

    /// The message this one replies to, if any.
    pub fn quoted_message(&self) -> Option<&Message> {
        self.context_info()?.quoted_message.as_deref()
    }

    pub fn is_forwarded(&self) -> bool {
        self.context_info()
            .and_then(|c| c.is_forwarded)
            .unwrap_or(false)
    }

    /// Number of populated media variants (image, video, audio, document).
    pub fn media_variant_count(&self) -> usize {
        [
            self.image_message.is_some(),
            self.video_message.is_some(),
            self.audio_message.is_some(),
            self.document_message.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// Reply and forwarding metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stanza_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_message: Option<Box<Message>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_forwarded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forwarding_score: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mentioned_jid: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtendedTextMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gif_playback: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// Audio clip or voice note (`ptt`). Protocol audio carries no caption.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ptt: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DocumentMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StickerMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_animated: Option<bool>,
    #[serde(flatten)]
    pub media: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_longitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}

/// Key of the message a reaction points at.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_me: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ReactionMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<MessageKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_timestamp_ms: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_amount1000: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retailer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_owner_jid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_info: Option<ContextInfo>,
}
