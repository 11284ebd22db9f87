//! Live channel frame processing loop.
//!
//! Reads frames from an open [`SocketConnection`], answers engine pings,
//! and publishes decoded events on the channel's [`EventBus`].

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::channel::EventBus;
use crate::messages::{parse_packet, Packet, PONG_PACKET};
use crate::socket::SocketConnection;

/// Why a session stopped processing frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The channel is shutting down.
    Cancelled,
    /// The server closed the transport or the namespace.
    Closed,
    /// A transport error or exhausted stream.
    Dropped(String),
}

/// Process frames until the connection ends or `cancel` fires.
pub async fn process_frames(
    conn: SocketConnection,
    bus: &EventBus,
    cancel: &CancellationToken,
) -> SessionEnd {
    let sid = conn.sid;
    let (mut sink, mut stream) = conn.ws_stream.split();

    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Cancelled;
            }
            frame = stream.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => match parse_packet(&text) {
                Ok(Packet::Ping) => {
                    if let Err(e) = sink.send(Message::Text(PONG_PACKET.to_string())).await {
                        return SessionEnd::Dropped(format!("Failed to send pong: {e}"));
                    }
                }
                Ok(Packet::Event(event)) => {
                    tracing::debug!(sid = %sid, event = event.name().as_str(), "Live event");
                    bus.publish(event);
                }
                Ok(Packet::Close | Packet::Disconnected) => {
                    tracing::info!(sid = %sid, "Live channel closed by server");
                    return SessionEnd::Closed;
                }
                Ok(Packet::ConnectError(detail)) => {
                    tracing::error!(sid = %sid, %detail, "Live channel namespace rejected");
                    return SessionEnd::Closed;
                }
                Ok(Packet::Connected) => {
                    tracing::debug!(sid = %sid, "Joined live channel namespace");
                }
                Ok(Packet::Open(_) | Packet::Pong | Packet::Ignored) => {}
                Err(e) => {
                    tracing::warn!(
                        sid = %sid,
                        error = %e,
                        raw_message = %text,
                        "Failed to parse live channel packet",
                    );
                }
            },
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(sid = %sid, ?frame, "Live channel websocket closed");
                return SessionEnd::Closed;
            }
            Some(Ok(_)) => {
                // Binary and control frames carry nothing we subscribe to.
            }
            Some(Err(e)) => {
                tracing::error!(sid = %sid, error = %e, "Live channel receive error");
                return SessionEnd::Dropped(e.to_string());
            }
            None => return SessionEnd::Dropped("stream exhausted".into()),
        }
    }
}
