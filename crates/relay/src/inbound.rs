//! Inbound pipeline: normalize, fetch media, relay.

use std::sync::Arc;

use {
    tracing::{debug, info, warn},
    wabridge_protocol::{Message, MessageEvent, SharedClient},
};

use crate::{
    attachment::{MediaCategory, resolve_filename},
    compose::{ComposeOptions, compose},
    history::EventHistory,
    message::{Attachment, CanonicalMessage},
    webhook::WebhookRelay,
};

/// Timestamp layout relay receivers expect, e.g. `2024-05-01 10:00:00 +0000 UTC`.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z %Z";

pub struct Normalizer {
    client: SharedClient,
    relay: WebhookRelay,
    history: Arc<EventHistory>,
    options: ComposeOptions,
}

impl Normalizer {
    pub fn new(
        client: SharedClient,
        relay: WebhookRelay,
        history: Arc<EventHistory>,
        options: ComposeOptions,
    ) -> Self {
        Self {
            client,
            relay,
            history,
            options,
        }
    }

    /// Process one event end to end. Never fails; problems are logged.
    ///
    /// Returns the relay response body, or `None` when the event is not
    /// relayed (status broadcasts).
    pub async fn handle(&self, event: MessageEvent) -> Option<String> {
        self.history.push(event.clone());

        let (message, attachment) = self.normalize(&event).await;
        if event.info.chat.is_status_broadcast() {
            debug!(message_id = %message.id, "skipping status broadcast");
            return None;
        }

        info!(
            message_id = %message.id,
            chat = %message.chat,
            media_type = %message.media_type,
            has_attachment = !attachment.is_empty(),
            "relaying inbound message"
        );
        Some(self.relay.relay(&message, &attachment).await)
    }

    /// Canonical record plus downloaded attachment for `event`.
    pub async fn normalize(&self, event: &MessageEvent) -> (CanonicalMessage, Attachment) {
        let message = canonicalize(event, &self.options);
        let attachment = self.resolve_attachment(event).await;
        (message, attachment)
    }

    async fn resolve_attachment(&self, event: &MessageEvent) -> Attachment {
        let category = MediaCategory::from(event.info.media_type.as_str());
        let mut attachment = Attachment::default();

        if category != MediaCategory::None {
            let filename = resolve_filename(&category, &event.message);
            if !filename.is_empty() {
                attachment = Attachment {
                    data: self.download(&event.message, &category).await,
                    filename,
                };
            }
        }

        // A quoted image, video or voice note replaces the primary file.
        if let Some(quoted) = event.message.quoted_message() {
            let candidates = [
                (quoted.image_message.is_some(), MediaCategory::Image),
                (quoted.video_message.is_some(), MediaCategory::Video),
                (quoted.audio_message.is_some(), MediaCategory::Audio),
            ];
            for (_, category) in candidates.into_iter().filter(|(present, _)| *present) {
                if let Some(data) = self.download(quoted, &category).await {
                    attachment = Attachment::new(data, resolve_filename(&category, quoted));
                }
            }
        }

        attachment
    }

    async fn download(&self, message: &Message, category: &MediaCategory) -> Option<Vec<u8>> {
        match self.client.download_any(message).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(category = %category, error = %e, "media download failed");
                None
            },
        }
    }
}

/// Flatten the envelope and compose the display text.
pub fn canonicalize(event: &MessageEvent, options: &ComposeOptions) -> CanonicalMessage {
    let info = &event.info;
    let composed = compose(event, options);
    CanonicalMessage {
        id: info.id.clone(),
        chat: info.chat.to_string(),
        caption: composed.caption,
        sender: info.sender.to_string(),
        sender_name: info.push_name.clone(),
        is_from_me: info.is_from_me,
        is_group: info.is_group && options.group_handling,
        is_ephemeral: event.is_ephemeral,
        is_view_once: event.is_view_once,
        timestamp: info.timestamp.format(TIMESTAMP_FORMAT).to_string(),
        media_type: info.media_type.clone(),
        multicast: info.multicast,
        conversation: composed.conversation,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::FakeClient,
        chrono::{TimeZone, Utc},
        mockito::Matcher,
        wabridge_protocol::{
            AudioMessage, ContextInfo, ExtendedTextMessage, ImageMessage, Jid, MessageInfo,
            StickerMessage,
        },
    };

    fn event(chat: Jid, media_type: &str, message: Message) -> MessageEvent {
        MessageEvent {
            info: MessageInfo {
                id: "3EB0AA".into(),
                is_group: chat.is_group(),
                chat,
                sender: Jid::new("15550001111", "s.whatsapp.net"),
                push_name: "Alice".into(),
                is_from_me: false,
                timestamp: Utc.timestamp_opt(1_714_557_600, 0).unwrap(),
                media_type: media_type.into(),
                multicast: false,
            },
            message,
            is_ephemeral: false,
            is_view_once: true,
        }
    }

    fn direct() -> Jid {
        Jid::new("15550001111", "s.whatsapp.net")
    }

    fn normalizer(client: FakeClient, relay_url: Option<String>) -> (Normalizer, Arc<EventHistory>) {
        let history = Arc::new(EventHistory::new(8));
        let normalizer = Normalizer::new(
            Arc::new(client),
            WebhookRelay::new(relay_url),
            Arc::clone(&history),
            ComposeOptions::default(),
        );
        (normalizer, history)
    }

    fn sticker() -> Message {
        Message {
            sticker_message: Some(StickerMessage::default()),
            ..Default::default()
        }
    }

    #[test]
    fn canonical_envelope() {
        let ev = event(direct(), "", Message {
            conversation: Some("hi".into()),
            ..Default::default()
        });
        let msg = canonicalize(&ev, &ComposeOptions::default());
        assert_eq!(msg.id, "3EB0AA");
        assert_eq!(msg.chat, "15550001111@s.whatsapp.net");
        assert_eq!(msg.sender_name, "Alice");
        assert_eq!(msg.timestamp, "2024-05-01 10:00:00 +0000 UTC");
        assert_eq!(msg.conversation, "hi");
        assert!(msg.is_view_once);
        assert!(!msg.is_group);
    }

    #[test]
    fn group_flag_follows_group_handling() {
        let ev = event(Jid::new("1203", "g.us"), "", Message::default());
        assert!(canonicalize(&ev, &ComposeOptions::default()).is_group);
        let off = ComposeOptions {
            group_handling: false,
            ..Default::default()
        };
        assert!(!canonicalize(&ev, &off).is_group);
    }

    #[tokio::test]
    async fn downloads_primary_media() {
        let client = FakeClient::default().with_media("sticker", b"RIFFxxxxWEBP");
        let (normalizer, _) = normalizer(client, None);
        let (_, attachment) = normalizer.normalize(&event(direct(), "sticker", sticker())).await;
        assert!(!attachment.is_empty());
        assert!(attachment.filename.ends_with(".webp"));
    }

    #[tokio::test]
    async fn failed_download_yields_empty_attachment() {
        let (normalizer, _) = normalizer(FakeClient::default(), None);
        let (_, attachment) = normalizer.normalize(&event(direct(), "sticker", sticker())).await;
        assert!(attachment.is_empty());
    }

    #[tokio::test]
    async fn text_message_skips_download() {
        let client = Arc::new(FakeClient::default());
        let normalizer = Normalizer::new(
            client.clone(),
            WebhookRelay::new(None),
            Arc::new(EventHistory::default()),
            ComposeOptions::default(),
        );
        let (_, attachment) = normalizer.normalize(&event(direct(), "", Message::default())).await;
        assert!(attachment.is_empty());
        assert!(client.downloads().is_empty());
    }

    #[tokio::test]
    async fn quoted_media_replaces_attachment() {
        let quoted = Message {
            audio_message: Some(AudioMessage::default()),
            ..Default::default()
        };
        let msg = Message {
            extended_text_message: Some(ExtendedTextMessage {
                text: Some("what is this?".into()),
                context_info: Some(ContextInfo {
                    quoted_message: Some(Box::new(quoted)),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let client = FakeClient::default().with_media("audio", b"ID3voice");
        let (normalizer, _) = normalizer(client, None);
        let (_, attachment) = normalizer.normalize(&event(direct(), "", msg)).await;
        assert_eq!(attachment.data.as_deref(), Some(&b"ID3voice"[..]));
        assert!(attachment.filename.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn failed_quoted_download_keeps_primary() {
        let quoted = Message {
            image_message: Some(ImageMessage::default()),
            ..Default::default()
        };
        let msg = Message {
            sticker_message: Some(StickerMessage {
                context_info: Some(ContextInfo {
                    quoted_message: Some(Box::new(quoted)),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let client = FakeClient::default().with_media("sticker", b"sticker-bytes");
        let (normalizer, _) = normalizer(client, None);
        let (_, attachment) = normalizer.normalize(&event(direct(), "sticker", msg)).await;
        assert_eq!(attachment.data.as_deref(), Some(&b"sticker-bytes"[..]));
        assert!(attachment.filename.ends_with(".webp"));
    }

    #[tokio::test]
    async fn relays_and_records_history() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::Regex(r#"name="Conversation"\r\n\r\nhi"#.into()))
            .with_status(200)
            .with_body("stored")
            .create_async()
            .await;

        let (normalizer, history) =
            normalizer(FakeClient::default(), Some(format!("{}/hook", server.url())));
        let body = normalizer
            .handle(event(direct(), "", Message {
                conversation: Some("hi".into()),
                ..Default::default()
            }))
            .await;

        assert_eq!(body.as_deref(), Some("stored"));
        assert_eq!(history.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn status_broadcast_is_not_relayed() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let (normalizer, history) =
            normalizer(FakeClient::default(), Some(format!("{}/hook", server.url())));
        let status: Jid = "status@broadcast".parse().unwrap();
        let body = normalizer.handle(event(status, "", Message::default())).await;

        assert!(body.is_none());
        assert_eq!(history.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unreachable_relay_still_completes() {
        let (normalizer, history) =
            normalizer(FakeClient::default(), Some("http://127.0.0.1:1/hook".into()));
        let body = normalizer.handle(event(direct(), "", Message::default())).await;
        assert_eq!(body.as_deref(), Some(""));
        assert_eq!(history.last().unwrap().info.id, "3EB0AA");
    }
}
