//! Turns API send requests into protocol messages, uploading media first.

use {
    serde::{Deserialize, Serialize},
    tracing::{debug, info},
    wabridge_media::{detect_mime, fetch_bytes},
    wabridge_protocol::{
        AudioMessage, DocumentMessage, ImageMessage, MediaRef, MediaType, OutboundMessage,
        SharedClient, UploadResponse, VideoMessage,
    },
};

use crate::error::{Error, Result};

/// Body of `POST /api/message/send`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendRequest {
    pub receiver: String,
    pub message: String,
    /// URL of media to attach; `message` becomes its caption.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
}

impl SendRequest {
    fn media_url(&self) -> Option<&str> {
        self.media.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}

pub struct OutboundComposer {
    client: SharedClient,
    http: reqwest::Client,
}

impl OutboundComposer {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
        }
    }

    /// Build the message for `request`. Media is fetched, sniffed from its
    /// bytes and uploaded under the matching category.
    pub async fn compose(&self, request: &SendRequest) -> Result<OutboundMessage> {
        let Some(url) = request.media_url() else {
            return Ok(OutboundMessage::text(request.message.clone()));
        };

        let data = fetch_bytes(&self.http, url).await.map_err(|source| {
            let context = if source.is_body_error() {
                "error reading file body"
            } else {
                "error getting media file by URL"
            };
            Error::Fetch { context, source }
        })?;

        let mime = detect_mime(&data);
        let caption = Some(request.message.clone());
        let mimetype = Some(mime.to_string());
        debug!(url, mime, bytes = data.len(), "composing media message");

        let message = match mime {
            "image/jpeg" | "image/png" => {
                let media = self.upload(data, MediaType::Image, "error uploading image").await?;
                OutboundMessage::Image(ImageMessage {
                    caption,
                    mimetype,
                    media: media.into(),
                    context_info: None,
                })
            },
            "audio/ogg" | "audio/mp3" | "audio/mp4" | "audio/mpeg" | "audio/amr" => {
                let media = self
                    .upload(data, MediaType::Audio, "error uploading audio file")
                    .await?;
                OutboundMessage::Audio(AudioMessage {
                    mimetype,
                    media: media.into(),
                    ..Default::default()
                })
            },
            "video/mp4" => {
                let media = self
                    .upload(data, MediaType::Video, "error uploading video file")
                    .await?;
                OutboundMessage::Video(VideoMessage {
                    caption,
                    mimetype,
                    media: MediaRef::from(media),
                    ..Default::default()
                })
            },
            _ => {
                let media = self
                    .upload(data, MediaType::Document, "error uploading document file")
                    .await?;
                let name = last_path_segment(url);
                OutboundMessage::Document(DocumentMessage {
                    title: Some(name.clone()),
                    file_name: Some(name),
                    mimetype,
                    media: media.into(),
                    ..Default::default()
                })
            },
        };

        info!(kind = message.kind(), mime, "media uploaded");
        Ok(message)
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        media_type: MediaType,
        context: &'static str,
    ) -> Result<UploadResponse> {
        self.client
            .upload(data, media_type)
            .await
            .map_err(|source| Error::Upload { context, source })
    }
}

/// Final segment of the URL path, used as the document name.
fn last_path_segment(media_url: &str) -> String {
    let path = match url::Url::parse(media_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => media_url.to_string(),
    };
    path.rsplit('/').next().unwrap_or_default().to_string()
}
