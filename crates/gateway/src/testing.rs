//! In-memory client used by route tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use {
    async_trait::async_trait,
    chrono::Utc,
    wabridge_protocol::{
        Error, Jid, MediaType, Message, MessageEvent, MessageInfo, MessagingClient,
        OutboundMessage, Result, SendReceipt, UploadResponse,
    },
    wabridge_relay::{Bridge, BridgeOptions},
};

#[derive(Default)]
pub struct FakeClient {
    pub connected: AtomicBool,
    pub fail_send: bool,
    pub sent: Mutex<Vec<(Jid, OutboundMessage)>>,
}

impl FakeClient {
    pub fn sent(&self) -> Vec<(Jid, OutboundMessage)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
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

    async fn download_any(&self, _message: &Message) -> Result<Vec<u8>> {
        Err(Error::remote("download", "no media"))
    }

    async fn upload(&self, _data: Vec<u8>, _media_type: MediaType) -> Result<UploadResponse> {
        Err(Error::remote("upload", "not supported"))
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
            id: "3EB0GW".into(),
            timestamp: Utc::now(),
        })
    }
}

pub fn bridge_with(client: FakeClient) -> (Arc<Bridge>, Arc<FakeClient>) {
    let client = Arc::new(client);
    let bridge = Arc::new(Bridge::new(client.clone(), BridgeOptions::default()));
    (bridge, client)
}

pub fn bridge() -> (Arc<Bridge>, Arc<FakeClient>) {
    bridge_with(FakeClient::default())
}

pub fn text_event(id: &str, text: &str) -> MessageEvent {
    let sender = Jid::new("15550001111", "s.whatsapp.net");
    MessageEvent {
        info: MessageInfo {
            id: id.into(),
            chat: sender.clone(),
            sender,
            push_name: "Alice".into(),
            is_from_me: false,
            is_group: false,
            timestamp: Utc::now(),
            media_type: String::new(),
            multicast: false,
        },
        message: Message {
            conversation: Some(text.into()),
            ..Default::default()
        },
        is_ephemeral: false,
        is_view_once: false,
    }
}
