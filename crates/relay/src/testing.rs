//! In-memory `MessagingClient` for unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use {
    async_trait::async_trait,
    chrono::Utc,
    wabridge_protocol::{
        Error, Jid, MediaType, Message, MessagingClient, OutboundMessage, Result, SendReceipt,
        UploadResponse,
    },
};

/// Serves downloads keyed by the variant present on the message, records
/// uploads and sends.
#[derive(Default)]
pub struct FakeClient {
    pub media: HashMap<&'static str, Vec<u8>>,
    pub fail_upload: bool,
    pub fail_send: bool,
    pub connected: AtomicBool,
    pub uploads: Mutex<Vec<MediaType>>,
    pub sent: Mutex<Vec<(Jid, OutboundMessage)>>,
    pub downloads: Mutex<Vec<&'static str>>,
}

impl FakeClient {
    pub fn with_media(mut self, variant: &'static str, data: &[u8]) -> Self {
        self.media.insert(variant, data.to_vec());
        self
    }

    pub fn uploads(&self) -> Vec<MediaType> {
        self.uploads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent(&self) -> Vec<(Jid, OutboundMessage)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn downloads(&self) -> Vec<&'static str> {
        self.downloads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn variant_of(message: &Message) -> Option<&'static str> {
    if message.image_message.is_some() {
        Some("image")
    } else if message.video_message.is_some() {
        Some("video")
    } else if message.audio_message.is_some() {
        Some("audio")
    } else if message.document_message.is_some() {
        Some("document")
    } else if message.sticker_message.is_some() {
        Some("sticker")
    } else if message.contact_message.is_some() {
        Some("contact")
    } else {
        None
    }
}

#[async_trait]
impl MessagingClient for FakeClient {
    async fn connect(&self) -> Result<()> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn download_any(&self, message: &Message) -> Result<Vec<u8>> {
        let variant = variant_of(message).ok_or_else(|| Error::remote("download", "no media"))?;
        self.downloads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(variant);
        self.media
            .get(variant)
            .cloned()
            .ok_or_else(|| Error::remote("download", format!("{variant} unavailable")))
    }

    async fn upload(&self, data: Vec<u8>, media_type: MediaType) -> Result<UploadResponse> {
        if self.fail_upload {
            return Err(Error::remote("upload", "media server refused"));
        }
        self.uploads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(media_type);
        Ok(UploadResponse {
            url: format!("https://mmg.test/{media_type}"),
            direct_path: format!("/{media_type}"),
            media_key: vec![1; 32],
            file_enc_sha256: vec![2; 32],
            file_sha256: vec![3; 32],
            file_length: data.len() as u64,
        })
    }

    async fn send_message(&self, to: &Jid, message: &OutboundMessage) -> Result<SendReceipt> {
        if self.fail_send {
            return Err(Error::NotConnected);
        }
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((to.clone(), message.clone()));
        Ok(SendReceipt {
            id: "3EB0SENT".into(),
            timestamp: Utc::now(),
        })
    }
}
