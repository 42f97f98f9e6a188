use brainchat_types::{ClientEvent, ServerEvent};

/// Everything the session learns from the connection, in arrival order.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    Connected,
    Disconnected { reason: Option<String> },
    Server(ServerEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("already connected")]
    AlreadyConnected,
    #[error("not connected yet")]
    NotConnected,
    #[error("connection closed")]
    Closed,
    #[error("outbound queue is full, event dropped")]
    Backpressure,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Outbound half of the event stream.
///
/// `publish` is fire-and-forget: it never waits for the peer, and an event
/// that cannot be queued is reported once and then lost.
#[cfg_attr(test, mockall::automock)]
pub trait Transport {
    fn publish(&self, event: ClientEvent) -> Result<(), TransportError>;
}
