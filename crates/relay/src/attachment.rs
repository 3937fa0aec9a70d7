//! Filename synthesis for downloaded media.

use std::{convert::Infallible, fmt, str::FromStr};

use {serde::Serialize, wabridge_protocol::Message};

/// Media category declared on the message envelope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaCategory {
    Image,
    Video,
    Gif,
    Audio,
    Ptt,
    Document,
    Sticker,
    /// Contact card; declared as `vcard`.
    Contact,
    Product,
    Location,
    /// Text-only message (empty declared type).
    None,
    Other(String),
}

impl MediaCategory {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Gif => "gif",
            Self::Audio => "audio",
            Self::Ptt => "ptt",
            Self::Document => "document",
            Self::Sticker => "sticker",
            Self::Contact => "vcard",
            Self::Product => "product",
            Self::Location => "location",
            Self::None => "",
            Self::Other(other) => other,
        }
    }
}

impl FromStr for MediaCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "image" => Self::Image,
            "video" => Self::Video,
            "gif" => Self::Gif,
            "audio" => Self::Audio,
            "ptt" => Self::Ptt,
            "document" => Self::Document,
            "sticker" => Self::Sticker,
            "vcard" => Self::Contact,
            "product" => Self::Product,
            "location" => Self::Location,
            "" => Self::None,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for MediaCategory {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synthesize the relay filename for `message` under `category`.
///
/// Empty when the category carries no downloadable file.
pub fn resolve_filename(category: &MediaCategory, message: &Message) -> String {
    match category {
        MediaCategory::Sticker => format!("{}.webp", hash_variant(message.sticker_message.as_ref())),
        MediaCategory::Gif | MediaCategory::Video => {
            format!("{}.mp4", hash_variant(message.video_message.as_ref()))
        },
        MediaCategory::Image => {
            let mime = message
                .image_message
                .as_ref()
                .and_then(|m| m.mimetype.as_deref())
                .unwrap_or_default();
            format!(
                "{}.{}",
                hash_variant(message.image_message.as_ref()),
                image_extension(mime)
            )
        },
        MediaCategory::Document => message
            .document_message
            .as_ref()
            .and_then(|m| m.file_name.clone())
            .unwrap_or_default(),
        MediaCategory::Contact => {
            let name = message
                .contact_message
                .as_ref()
                .and_then(|m| m.display_name.as_deref())
                .unwrap_or_default();
            format!("{name}.vcf")
        },
        MediaCategory::Ptt => format!("{}.ogg", hash_variant(message.audio_message.as_ref())),
        MediaCategory::Audio => format!("{}.mp3", hash_variant(message.audio_message.as_ref())),
        MediaCategory::Product => message
            .product_message
            .as_ref()
            .map(|p| format!("{}.jpg", repr(p)))
            .unwrap_or_default(),
        MediaCategory::Location | MediaCategory::None | MediaCategory::Other(_) => String::new(),
    }
}

fn image_extension(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        _ => "png",
    }
}

/// Compact JSON of a variant; empty for a missing one.
fn repr<T: Serialize>(variant: &T) -> String {
    serde_json::to_string(variant).unwrap_or_default()
}

fn hash_variant<T: Serialize>(variant: Option<&T>) -> String {
    let text = variant.map(repr).unwrap_or_default();
    fnv1a_32(text.as_bytes()).to_string()
}

/// 32-bit FNV-1a.
pub fn fnv1a_32(data: &[u8]) -> u32 {
    const OFFSET_BASIS: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    data.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(PRIME)
    })
}
