//! Media upload categories and descriptors.

use serde::{Deserialize, Serialize};

/// Category under which bytes are encrypted and uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor returned by the client after accepting uploaded bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub direct_path: String,
    #[serde(with = "base64_bytes")]
    pub media_key: Vec<u8>,
    #[serde(rename = "fileEncSha256", with = "base64_bytes")]
    pub file_enc_sha256: Vec<u8>,
    #[serde(rename = "fileSha256", with = "base64_bytes")]
    pub file_sha256: Vec<u8>,
    pub file_length: u64,
}

/// Media location and key material embedded in every media variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", with = "base64_opt")]
    pub media_key: Option<Vec<u8>>,
    #[serde(
        rename = "fileEncSha256",
        skip_serializing_if = "Option::is_none",
        with = "base64_opt"
    )]
    pub file_enc_sha256: Option<Vec<u8>>,
    #[serde(
        rename = "fileSha256",
        skip_serializing_if = "Option::is_none",
        with = "base64_opt"
    )]
    pub file_sha256: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_length: Option<u64>,
}

impl From<UploadResponse> for MediaRef {
    fn from(upload: UploadResponse) -> Self {
        Self {
            url: Some(upload.url),
            direct_path: Some(upload.direct_path),
            media_key: Some(upload.media_key),
            file_enc_sha256: Some(upload.file_enc_sha256),
            file_sha256: Some(upload.file_sha256),
            file_length: Some(upload.file_length),
        }
    }
}

/// Byte fields travel as standard base64 strings.
pub mod base64_bytes {
    use {
        base64::{Engine, engine::general_purpose::STANDARD},
        serde::{Deserialize, Deserializer, Serializer},
    };

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(serde::de::Error::custom)
    }
}

mod base64_opt {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        bytes: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => super::base64_bytes::serialize(bytes, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| {
            use base64::Engine;
            base64::engine::general_purpose::STANDARD
                .decode(s)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}
