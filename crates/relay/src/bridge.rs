//! Facade tying the inbound and outbound pipelines to one client.

use std::{sync::Arc, time::Duration};

use {
    tokio::sync::mpsc,
    tracing::{info, warn},
    wabridge_protocol::{
        ClientEvent, DEFAULT_HISTORY_CAPACITY, MessageEvent, SendReceipt, SharedClient,
    },
};

use crate::{
    compose::ComposeOptions,
    error::Result,
    history::EventHistory,
    inbound::Normalizer,
    outbound::{OutboundComposer, SendRequest},
    recipient::parse_recipient,
    webhook::{DEFAULT_RELAY_TIMEOUT, WebhookRelay},
};

#[derive(Debug, Clone)]
pub struct BridgeOptions {
    pub relay_url: Option<String>,
    pub relay_timeout: Duration,
    pub compose: ComposeOptions,
    pub history_capacity: usize,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            relay_url: None,
            relay_timeout: DEFAULT_RELAY_TIMEOUT,
            compose: ComposeOptions::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

pub struct Bridge {
    client: SharedClient,
    normalizer: Normalizer,
    composer: OutboundComposer,
    history: Arc<EventHistory>,
}

impl Bridge {
    pub fn new(client: SharedClient, options: BridgeOptions) -> Self {
        let history = Arc::new(EventHistory::new(options.history_capacity));
        let relay = WebhookRelay::new(options.relay_url).with_timeout(options.relay_timeout);
        Self {
            normalizer: Normalizer::new(
                Arc::clone(&client),
                relay,
                Arc::clone(&history),
                options.compose,
            ),
            composer: OutboundComposer::new(Arc::clone(&client)),
            client,
            history,
        }
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// Resolve, compose and send one outbound message.
    pub async fn send_message(&self, request: &SendRequest) -> Result<SendReceipt> {
        let to = parse_recipient(&request.receiver)?;
        let message = self.composer.compose(request).await?;
        let receipt = self.client.send_message(&to, &message).await?;
        info!(to = %to, kind = message.kind(), message_id = %receipt.id, "message sent");
        Ok(receipt)
    }

    /// Most recent inbound event, if any arrived yet.
    pub fn last_message(&self) -> Option<MessageEvent> {
        self.history.last()
    }

    /// Handle one client event.
    pub async fn handle_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Message(event) => {
                self.normalizer.handle(*event).await;
            },
            ClientEvent::Connected { phone_number } => {
                info!(?phone_number, "whatsapp connected");
            },
            ClientEvent::Disconnected { reason } => {
                warn!(reason, "whatsapp disconnected");
            },
            ClientEvent::LoggedOut => {
                warn!("whatsapp session logged out; pair the sidecar again");
            },
        }
    }

    /// Consume events in arrival order until the channel closes.
    pub async fn run_event_loop(self: Arc<Self>, mut events: mpsc::Receiver<ClientEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        info!("event stream closed");
    }
}
