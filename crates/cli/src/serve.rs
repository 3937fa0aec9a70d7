//! `wabridge serve`: sidecar, bridge and gateway wired together.

use std::{sync::Arc, time::Duration};

use {
    anyhow::Context,
    tokio::sync::mpsc,
    tracing::{info, warn},
    wabridge_config::WabridgeConfig,
    wabridge_gateway::{GatewayState, start_gateway},
    wabridge_protocol::SharedClient,
    wabridge_relay::{Bridge, BridgeOptions, ComposeOptions},
    wabridge_whatsapp::{SidecarClient, SidecarConfig as ProcessConfig, start_sidecar},
};

/// Client events buffered between the sidecar reader and the event loop.
const EVENT_BUFFER: usize = 256;

pub async fn run(config: WabridgeConfig) -> anyhow::Result<()> {
    let mut sidecar_process = if config.sidecar.manages_process() {
        let process = start_sidecar(ProcessConfig {
            command: config.sidecar.command.clone(),
            dir: config.sidecar.dir.clone(),
            port: config.sidecar.port,
        })
        .await?;
        Some(process)
    } else {
        None
    };

    let url = config.sidecar.ws_url();
    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let client = SidecarClient::connect_with_retry(&url, events_tx, config.sidecar.connect_attempts)
        .await
        .with_context(|| format!("connecting to whatsapp sidecar at {url}"))?;
    let client: SharedClient = Arc::new(client);

    if config.sidecar.auto_connect {
        match client.connect().await {
            Ok(()) => info!("whatsapp session opened"),
            Err(e) => warn!(error = %e, "automatic whatsapp login failed"),
        }
    }

    if config.relay.url.is_none() {
        warn!("no relay url configured; inbound messages are only kept in history");
    }

    let bridge = Arc::new(Bridge::new(client, bridge_options(&config)));
    let event_loop = tokio::spawn(Arc::clone(&bridge).run_event_loop(events_rx));

    let state = GatewayState::new(bridge, config.server.api_token.clone());
    let result = start_gateway(state, &config.server.bind, config.server.port).await;

    event_loop.abort();
    if let Some(process) = sidecar_process.as_mut() {
        process.stop().await?;
    }
    result
}

fn bridge_options(config: &WabridgeConfig) -> BridgeOptions {
    BridgeOptions {
        relay_url: config.relay.url.clone(),
        relay_timeout: Duration::from_secs(config.relay.timeout_secs),
        compose: ComposeOptions {
            group_handling: config.inbound.group_handling,
            maps_base_url: config.inbound.maps_base_url.clone(),
        },
        history_capacity: config.inbound.history_capacity,
    }
}
