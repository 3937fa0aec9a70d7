//! WebSocket client for the sidecar, exposed as a [`MessagingClient`].

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    base64::{Engine, engine::general_purpose::STANDARD},
    futures::{SinkExt, StreamExt},
    serde::de::DeserializeOwned,
    tokio::{
        net::TcpStream,
        sync::{mpsc, oneshot},
    },
    tokio_tungstenite::{
        MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message as WsMessage,
    },
    tracing::{debug, info, warn},
    wabridge_protocol::{
        ClientEvent, Error, Jid, MediaType, Message, MessagingClient,
        OutboundMessage, Result, SendReceipt, UploadResponse,
    },
};

use crate::types::{
    ConnectionState, DownloadResult, GatewayMessage, ResponseFrame, SidecarMessage,
};

const RETRY_DELAY: Duration = Duration::from_millis(500);
const CONNECTION_CLOSED: &str = "sidecar connection closed";

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<ResponseFrame>>>>;
type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Request/response client over one sidecar WebSocket.
///
/// Cloning shares the connection.
#[derive(Clone)]
pub struct SidecarClient {
    write_tx: mpsc::UnboundedSender<String>,
    pending: Pending,
    state: Arc<Mutex<ConnectionState>>,
    open: Arc<AtomicBool>,
}

impl SidecarClient {
    /// Connect to `url`, retrying with a fixed delay while the sidecar is
    /// still starting. Events are forwarded to `events_tx` in arrival order.
    pub async fn connect_with_retry(
        url: &str,
        events_tx: mpsc::Sender<ClientEvent>,
        attempts: u32,
    ) -> Result<Self> {
        let attempts = attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            match connect_async(url).await {
                Ok((ws, _)) => {
                    info!(url, attempt, "connected to whatsapp sidecar");
                    return Ok(Self::spawn(ws, events_tx));
                },
                Err(e) => {
                    debug!(url, attempt, error = %e, "sidecar not reachable yet");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                },
            }
        }

        let message = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(Error::remote(
            "connect to sidecar",
            format!("{url} unreachable after {attempts} attempts: {message}"),
        ))
    }

    fn spawn(ws: WsStream, events_tx: mpsc::Sender<ClientEvent>) -> Self {
        let (mut ws_sink, mut ws_reader) = ws.split();
        let (write_tx, mut write_rx) = mpsc::unbounded_channel::<String>();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let state = Arc::new(Mutex::new(ConnectionState::Disconnected));
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(async move {
            while let Some(text) = write_rx.recv().await {
                if let Err(e) = ws_sink.send(WsMessage::Text(text.into())).await {
                    warn!(error = %e, "sidecar write failed");
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        // The reader never awaits the event consumer; events queue here.
        let (queue_tx, mut queue_rx) = mpsc::unbounded_channel::<ClientEvent>();
        tokio::spawn(async move {
            while let Some(event) = queue_rx.recv().await {
                if events_tx.send(event).await.is_err() {
                    debug!("event receiver dropped");
                    break;
                }
            }
        });

        let reader_pending = Arc::clone(&pending);
        let reader_state = Arc::clone(&state);
        let reader_open = Arc::clone(&open);
        tokio::spawn(async move {
            while let Some(frame) = ws_reader.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => {
                        if let Some(event) =
                            handle_frame(text.as_str(), &reader_pending, &reader_state)
                        {
                            let _ = queue_tx.send(event);
                        }
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {},
                    Err(e) => {
                        warn!(error = %e, "sidecar read failed");
                        break;
                    },
                }
            }

            info!("sidecar connection closed");
            reader_open.store(false, Ordering::SeqCst);
            // Dropping the senders fails every in-flight request.
            reader_pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clear();
            *reader_state.lock().unwrap_or_else(|e| e.into_inner()) =
                ConnectionState::Disconnected;
            let _ = queue_tx.send(ClientEvent::Disconnected {
                reason: CONNECTION_CLOSED.into(),
            });
        });

        Self {
            write_tx,
            pending,
            state,
            open,
        }
    }

    /// False once the socket has closed; the client does not reconnect.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ConnectionState {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn request(&self, frame: GatewayMessage) -> Result<Option<serde_json::Value>> {
        let operation = frame.operation();
        let request_id = frame.request_id().to_string();
        let text = serde_json::to_string(&frame)?;

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(request_id.clone(), tx);

        if !self.is_open() || self.write_tx.send(text).is_err() {
            self.pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&request_id);
            return Err(Error::remote(operation, CONNECTION_CLOSED));
        }

        let response = rx
            .await
            .map_err(|_| Error::remote(operation, CONNECTION_CLOSED))?;
        if !response.ok {
            let message = response.error.unwrap_or_else(|| "unknown error".into());
            return Err(Error::remote(operation, message));
        }
        Ok(response.result)
    }

    async fn request_as<T: DeserializeOwned>(&self, frame: GatewayMessage) -> Result<T> {
        let operation = frame.operation();
        let result = self
            .request(frame)
            .await?
            .ok_or_else(|| Error::remote(operation, "response carried no result"))?;
        Ok(serde_json::from_value(result)?)
    }
}

/// Resolves responses in place; anything else is returned as an event.
fn handle_frame(
    text: &str,
    pending: &Pending,
    state: &Mutex<ConnectionState>,
) -> Option<ClientEvent> {
    let frame: SidecarMessage = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "unparseable sidecar frame");
            return None;
        },
    };

    let event = match frame {
        SidecarMessage::Response(response) => {
            let waiter = pending
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&response.request_id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(response);
                },
                None => debug!(request_id = %response.request_id, "response for unknown request"),
            }
            return None;
        },
        SidecarMessage::Message { event } => ClientEvent::Message(event),
        SidecarMessage::Connected { phone_number } => {
            *state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Connected {
                phone_number: phone_number.clone(),
            };
            ClientEvent::Connected { phone_number }
        },
        SidecarMessage::Disconnected { reason } => {
            *state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Disconnected;
            ClientEvent::Disconnected { reason }
        },
        SidecarMessage::LoggedOut => {
            *state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::LoggedOut;
            ClientEvent::LoggedOut
        },
    };
    Some(event)
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl MessagingClient for SidecarClient {
    async fn connect(&self) -> Result<()> {
        self.request(GatewayMessage::Connect {
            request_id: new_request_id(),
        })
        .await?;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.request(GatewayMessage::Disconnect {
            request_id: new_request_id(),
        })
        .await?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        matches!(self.state(), ConnectionState::Connected { .. })
    }

    async fn download_any(&self, message: &Message) -> Result<Vec<u8>> {
        let result: DownloadResult = self
            .request_as(GatewayMessage::Download {
                request_id: new_request_id(),
                message: Box::new(message.clone()),
            })
            .await?;
        STANDARD
            .decode(result.data)
            .map_err(|e| Error::external("decoding downloaded media", e))
    }

    async fn upload(&self, data: Vec<u8>, media_type: MediaType) -> Result<UploadResponse> {
        self.request_as(GatewayMessage::Upload {
            request_id: new_request_id(),
            media_type,
            data: STANDARD.encode(data),
        })
        .await
    }

    async fn send_message(&self, to: &Jid, message: &OutboundMessage) -> Result<SendReceipt> {
        self.request_as(GatewayMessage::Send {
            request_id: new_request_id(),
            to: to.clone(),
            message: Box::new(message.to_message()),
        })
        .await
    }
}
