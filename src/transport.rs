//! Text-frame transports for the push channel.
//!
//! A [`Transport`] carries JSON text frames in both directions. A
//! [`Connector`] opens fresh transports, which is what the channel uses to
//! reconnect. [`WsConnector`] talks WebSocket; [`loopback`] builds an
//! in-memory pair for tests and offline play.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::collections::VecDeque;
use strictly_wordgrid::{ClientIntent, ServerEvent};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, instrument, warn};

/// Error from a transport.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum TransportError {
    /// Opening the connection failed.
    #[display("Connect failed: {}", _0)]
    Connect(String),

    /// The connection broke.
    #[display("Connection error: {}", _0)]
    Io(String),

    /// The peer is gone.
    #[display("Connection closed")]
    Closed,
}

impl std::error::Error for TransportError {}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

/// A bidirectional stream of text frames.
#[async_trait]
pub trait Transport: Send {
    /// Sends one frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Receives the next frame; `None` once the peer closed cleanly.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    /// Closes the connection.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens transports on demand.
#[async_trait]
pub trait Connector: Send + 'static {
    /// Transport this connector produces.
    type Transport: Transport + 'static;

    /// Opens a new connection.
    async fn connect(&mut self) -> Result<Self::Transport, TransportError>;
}

// ─────────────────────────────────────────────────────────────
//  WebSocket
// ─────────────────────────────────────────────────────────────

/// [`Transport`] over a WebSocket connection.
pub struct WsTransport {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.ws.send(Message::Text(frame)).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        while let Some(message) = self.ws.next().await {
            match message {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => return Some(Ok(text)),
                    Err(e) => warn!(error = %e, "Dropping non-UTF-8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "WebSocket closed by peer");
                    return None;
                }
                Ok(_) => {} // Ping/pong are answered by tungstenite.
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.ws.close(None).await?;
        Ok(())
    }
}

/// Connects to a WebSocket URL.
#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
}

impl WsConnector {
    /// Creates a connector for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Transport = WsTransport;

    #[instrument(skip(self), fields(url = %self.url))]
    async fn connect(&mut self) -> Result<WsTransport, TransportError> {
        let (ws, response) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        info!(status = %response.status(), "WebSocket connected");
        Ok(WsTransport { ws })
    }
}

// ─────────────────────────────────────────────────────────────
//  Loopback
// ─────────────────────────────────────────────────────────────

/// Client end of an in-memory connection.
pub struct LoopbackTransport {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<Option<String>>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, frame: String) -> Result<(), TransportError> {
        self.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        match self.inbound.recv().await {
            Some(Some(frame)) => Some(Ok(frame)),
            // An explicit `None` is a clean close; a dropped remote is a broken link.
            Some(None) => None,
            None => Some(Err(TransportError::Closed)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.inbound.close();
        Ok(())
    }
}

/// Authority end of an in-memory connection.
pub struct LoopbackRemote {
    inbound: mpsc::UnboundedReceiver<String>,
    outbound: mpsc::UnboundedSender<Option<String>>,
}

impl LoopbackRemote {
    /// Pushes an event to the client.
    ///
    /// # Errors
    ///
    /// [`TransportError::Closed`] if the client end is gone.
    pub fn push(&self, event: &ServerEvent) -> Result<(), TransportError> {
        let frame = serde_json::to_string(event).map_err(|e| TransportError::Io(e.to_string()))?;
        self.push_raw(frame)
    }

    /// Pushes a raw frame to the client.
    pub fn push_raw(&self, frame: impl Into<String>) -> Result<(), TransportError> {
        self.outbound
            .send(Some(frame.into()))
            .map_err(|_| TransportError::Closed)
    }

    /// Receives the next intent the client sent; `None` once the client is gone.
    ///
    /// Frames that do not parse as an intent are skipped.
    pub async fn next_intent(&mut self) -> Option<ClientIntent> {
        while let Some(frame) = self.inbound.recv().await {
            match serde_json::from_str(&frame) {
                Ok(intent) => return Some(intent),
                Err(e) => warn!(error = %e, "Loopback remote got an unparseable frame"),
            }
        }
        None
    }

    /// Closes the connection cleanly from the authority side.
    pub fn hang_up(&self) {
        let _ = self.outbound.send(None);
    }
}

/// Creates a connected in-memory transport pair.
pub fn loopback() -> (LoopbackTransport, LoopbackRemote) {
    let (to_remote, from_client) = mpsc::unbounded_channel();
    let (to_client, from_remote) = mpsc::unbounded_channel();
    (
        LoopbackTransport {
            outbound: to_remote,
            inbound: from_remote,
        },
        LoopbackRemote {
            inbound: from_client,
            outbound: to_client,
        },
    )
}

/// Hands out pre-built loopback transports, one per connect.
#[derive(Default)]
pub struct LoopbackConnector {
    queued: VecDeque<LoopbackTransport>,
}

impl LoopbackConnector {
    /// Creates a connector that yields `transports` in order, then fails.
    pub fn new(transports: impl IntoIterator<Item = LoopbackTransport>) -> Self {
        Self {
            queued: transports.into_iter().collect(),
        }
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    type Transport = LoopbackTransport;

    async fn connect(&mut self) -> Result<LoopbackTransport, TransportError> {
        self.queued
            .pop_front()
            .ok_or_else(|| TransportError::Connect("no loopback transport left".to_string()))
    }
}
