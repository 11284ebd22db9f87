//! WebSocket transport for the live notification channel.
//!
//! [`SocketClient`] holds the dispatcher's socket URL. Call
//! [`SocketClient::connect`] to open the transport, complete the engine
//! handshake and join the default namespace, yielding a live
//! [`SocketConnection`].

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::messages::{parse_packet, Handshake, Packet, CONNECT_PACKET};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// How long to wait for the server's engine handshake after the
/// websocket upgrade.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration handle for the dispatcher's live channel endpoint.
#[derive(Debug, Clone)]
pub struct SocketClient {
    socket_url: String,
}

/// An open, handshaken live channel connection.
pub struct SocketConnection {
    /// Engine session id assigned by the server.
    pub sid: String,
    pub ws_stream: WsStream,
}

impl SocketClient {
    /// * `socket_url` - WebSocket base URL, e.g. `ws://localhost:48008`.
    pub fn new(socket_url: impl Into<String>) -> Self {
        Self {
            socket_url: socket_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn socket_url(&self) -> &str {
        &self.socket_url
    }

    /// Full transport endpoint for the websocket-only engine transport.
    pub fn endpoint(&self) -> String {
        format!("{}/socket.io/?EIO=4&transport=websocket", self.socket_url)
    }

    /// Open the websocket, wait for the engine open packet and send the
    /// namespace connect packet.
    pub async fn connect(&self) -> Result<SocketConnection, SocketError> {
        let url = self.endpoint();
        let (mut ws_stream, _response) = connect_async(&url).await.map_err(|e| {
            SocketError::Connection(format!(
                "Failed to connect to live channel at {}: {e}",
                self.socket_url
            ))
        })?;

        let handshake = tokio::time::timeout(HANDSHAKE_TIMEOUT, read_handshake(&mut ws_stream))
            .await
            .map_err(|_| SocketError::Protocol("Timed out waiting for handshake".into()))??;

        ws_stream
            .send(Message::Text(CONNECT_PACKET.to_string()))
            .await
            .map_err(|e| SocketError::Protocol(format!("Failed to join namespace: {e}")))?;

        tracing::info!(
            sid = %handshake.sid,
            ping_interval_ms = handshake.ping_interval,
            "Connected to live channel at {}",
            self.socket_url,
        );

        Ok(SocketConnection {
            sid: handshake.sid,
            ws_stream,
        })
    }
}

async fn read_handshake(ws_stream: &mut WsStream) -> Result<Handshake, SocketError> {
    while let Some(frame) = ws_stream.next().await {
        let frame = frame.map_err(|e| SocketError::Protocol(e.to_string()))?;
        match frame {
            Message::Text(text) => {
                return match parse_packet(&text) {
                    Ok(Packet::Open(handshake)) => Ok(handshake),
                    Ok(other) => Err(SocketError::Protocol(format!(
                        "Expected open packet, got {other:?}"
                    ))),
                    Err(e) => Err(SocketError::Protocol(e.to_string())),
                };
            }
            Message::Close(frame) => {
                return Err(SocketError::Protocol(format!(
                    "Closed during handshake: {frame:?}"
                )));
            }
            _ => {}
        }
    }
    Err(SocketError::Protocol("Stream ended during handshake".into()))
}

/// Errors from the live channel transport.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    /// Failed to establish the websocket connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server did not follow the expected packet exchange.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
