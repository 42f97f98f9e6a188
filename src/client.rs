use std::sync::{Arc, Mutex};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use crate::transport::{Transport, TransportError, TransportEvent};
use crate::types;

pub mod config;
mod consts;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use stats::Stats;

pub type ClientTx = tokio::sync::mpsc::Sender<types::ClientEvent>;
type ServerTx = tokio::sync::broadcast::Sender<TransportEvent>;
pub type ServerRx = tokio::sync::broadcast::Receiver<TransportEvent>;

pub struct Connection {
    pub(crate) send_handle: tokio::task::JoinHandle<()>,
    pub(crate) recv_handle: tokio::task::JoinHandle<()>,
}

/// WebSocket connection to the inference service.
///
/// Outbound events go through a bounded queue drained by a send task;
/// inbound frames are decoded by a receive task and fanned out as
/// [`TransportEvent`]s to every subscriber.
pub struct Client {
    config: Config,
    c_tx: Option<ClientTx>,
    s_tx: Option<ServerTx>,
    first_rx: Option<ServerRx>,
    connection: Option<Connection>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    fn new(config: Config) -> Self {
        Self {
            config,
            c_tx: None,
            s_tx: None,
            first_rx: None,
            connection: None,
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.c_tx.is_some() {
            return Err(TransportError::AlreadyConnected);
        }

        let request = utils::build_request(&self.config)?;
        let (ws_stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!("connected to {}", self.config.url());

        let (mut write, mut read) = ws_stream.split();

        let (c_tx, mut c_rx) =
            tokio::sync::mpsc::channel::<types::ClientEvent>(self.config.capacity());
        let (s_tx, first_rx) = tokio::sync::broadcast::channel(self.config.capacity());

        // The first subscriber must not miss the status change.
        if let Err(e) = s_tx.send(TransportEvent::Connected) {
            tracing::error!("failed to send event: {}", e);
        }

        self.c_tx = Some(c_tx);
        self.s_tx = Some(s_tx.clone());
        self.first_rx = Some(first_rx);

        let send_handle = tokio::spawn(async move {
            while let Some(event) = c_rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        tracing::debug!("sending message: {}", event.name());
                        if let Err(e) = write.send(Message::Text(text)).await {
                            tracing::error!("failed to send message: {}", e);
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to serialize event: {}", e);
                    }
                }
            }
            if let Err(e) = write.close().await {
                tracing::debug!("failed to close connection: {}", e);
            }
        });

        let stats = self.stats.clone();
        let recv_handle = tokio::spawn(async move {
            let mut reason = None;
            while let Some(message) = read.next().await {
                let message = match message {
                    Err(e) => {
                        tracing::error!("failed to read message: {}", e);
                        reason = Some(e.to_string());
                        break;
                    }
                    Ok(message) => message,
                };
                match message {
                    Message::Text(text) => {
                        match serde_json::from_str::<types::ServerEvent>(&text) {
                            Ok(types::ServerEvent::Close { reason: close_reason }) => {
                                tracing::info!("server closed the session: {:?}", close_reason);
                                reason = close_reason;
                                break;
                            }
                            Ok(event) => {
                                tracing::debug!("received message: {}", event_name(&event));
                                if let types::ServerEvent::AiResponse(_) = event {
                                    if let Ok(mut stats_guard) = stats.lock() {
                                        stats_guard.record_response();
                                    } else {
                                        tracing::error!("failed to update stats");
                                    }
                                }
                                if let Err(e) = s_tx.send(TransportEvent::Server(event)) {
                                    tracing::error!("failed to send event: {}", e);
                                }
                            }
                            Err(e) => {
                                let json = serde_json::from_str::<serde_json::Value>(&text);
                                json.map(|json| {
                                    tracing::error!(
                                        "failed to deserialize event: {}, type=> {:?}",
                                        e,
                                        json
                                    );
                                })
                                .unwrap_or_else(|_| {
                                    tracing::error!(
                                        "failed to deserialize event: {}, text=> {:?}",
                                        e,
                                        text
                                    );
                                });
                            }
                        }
                    }
                    Message::Binary(bin) => {
                        tracing::warn!("unexpected binary message: {} bytes", bin.len());
                    }
                    Message::Close(frame) => {
                        tracing::info!("connection closed: {:?}", frame);
                        reason = frame.map(|frame| frame.reason.to_string());
                        break;
                    }
                    _ => {}
                }
            }

            if let Err(e) = s_tx.send(TransportEvent::Disconnected { reason }) {
                tracing::debug!("no subscriber for disconnect: {}", e);
            }
        });

        self.connection = Some(Connection {
            send_handle,
            recv_handle,
        });
        Ok(())
    }

    /// Subscribes to inbound events. The first call also receives the
    /// `Connected` event queued by `connect`.
    pub fn server_events(&mut self) -> Result<ServerRx, TransportError> {
        if let Some(rx) = self.first_rx.take() {
            return Ok(rx);
        }
        match self.s_tx {
            Some(ref tx) => Ok(tx.subscribe()),
            None => Err(TransportError::NotConnected),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.c_tx.is_some()
            && self
                .connection
                .as_ref()
                .is_some_and(|c| !c.send_handle.is_finished() && !c.recv_handle.is_finished())
    }

    /// Closes the outbound queue; the send task flushes and closes the socket.
    pub fn disconnect(&mut self) {
        if self.c_tx.take().is_some() {
            tracing::info!("disconnecting from {}", self.config.url());
        }
    }

    pub fn stats(&self) -> Stats {
        match self.stats.lock() {
            Ok(stats_guard) => stats_guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record(&self, f: impl FnOnce(&mut Stats)) {
        if let Ok(mut stats_guard) = self.stats.lock() {
            f(&mut stats_guard);
        } else {
            tracing::error!("failed to update stats");
        }
    }
}

impl Transport for Client {
    fn publish(&self, event: types::ClientEvent) -> Result<(), TransportError> {
        let is_signal = matches!(event, types::ClientEvent::BrainSignal(_));
        let result = match self.c_tx {
            Some(ref tx) => tx.try_send(event).map_err(|e| match e {
                tokio::sync::mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
                tokio::sync::mpsc::error::TrySendError::Closed(_) => TransportError::Closed,
            }),
            None => Err(TransportError::NotConnected),
        };
        match result {
            Ok(()) if is_signal => self.record(Stats::record_signal_sent),
            Ok(()) => self.record(Stats::record_text_sent),
            Err(_) => self.record(Stats::record_publish_failure),
        }
        result
    }
}

fn event_name(event: &types::ServerEvent) -> &'static str {
    match event {
        types::ServerEvent::Close { .. } => "close",
        types::ServerEvent::Error(_) => "error",
        types::ServerEvent::AiResponse(_) => "ai_response",
    }
}

pub async fn connect_with_config(config: Config) -> Result<Client, TransportError> {
    let mut client = Client::new(config);
    client.connect().await?;
    Ok(client)
}

pub async fn connect() -> Result<Client, TransportError> {
    let config = Config::new();
    connect_with_config(config).await
}
