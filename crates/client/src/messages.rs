//! Live channel packet types and parser.
//!
//! The dispatcher pushes notifications over the Socket.IO v4 websocket
//! transport. Every text frame is an engine packet whose first character
//! is its type; message packets (`4`) carry a socket packet whose second
//! character is its type. Events look like `42["result-update",{...}]`.

use covalent_core::status::DispatchStatus;
use covalent_core::types::DispatchId;
use serde::Deserialize;

/// Socket packet sent after the engine handshake to join the default
/// namespace.
pub const CONNECT_PACKET: &str = "40";

/// Engine pong, sent in reply to every engine ping.
pub const PONG_PACKET: &str = "3";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Names of the live events consumers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ResultUpdate,
    DrawRequest,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ResultUpdate => "result-update",
            Self::DrawRequest => "draw_request",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "result-update" => Some(Self::ResultUpdate),
            "draw_request" => Some(Self::DrawRequest),
            _ => None,
        }
    }
}

/// A decoded live event.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A dispatch's state changed on the server. A hint to refetch, never
    /// authoritative state.
    ResultUpdate(ResultUpdate),
    /// Lattice preview payload, passed through untouched.
    DrawRequest(serde_json::Value),
}

impl ChannelEvent {
    pub fn name(&self) -> EventName {
        match self {
            Self::ResultUpdate(_) => EventName::ResultUpdate,
            Self::DrawRequest(_) => EventName::DrawRequest,
        }
    }
}

/// Payload of a `result-update` event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultUpdate {
    pub result: ResultSummary,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResultSummary {
    pub dispatch_id: DispatchId,
    pub status: DispatchStatus,
}

impl ResultUpdate {
    pub fn new(dispatch_id: impl Into<DispatchId>, status: DispatchStatus) -> Self {
        Self {
            result: ResultSummary {
                dispatch_id: dispatch_id.into(),
                status,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Packets
// ---------------------------------------------------------------------------

/// Engine handshake sent by the server when the transport opens.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub ping_interval: u64,
    #[serde(default)]
    pub ping_timeout: u64,
}

/// One decoded text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    /// The namespace connect was acknowledged.
    Connected,
    Disconnected,
    ConnectError(serde_json::Value),
    Event(ChannelEvent),
    /// Packets this client has no use for (acks, binary placeholders, ...).
    Ignored,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,

    #[error("Unknown packet type {0:?}")]
    UnknownType(char),

    #[error("Unknown event {0:?}")]
    UnknownEvent(String),

    #[error("Malformed packet: {0}")]
    Malformed(String),

    #[error("Invalid packet JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse a live channel text frame into a typed [`Packet`].
///
/// Returns `Err` for malformed frames and unknown event names. Callers
/// should log and continue.
pub fn parse_packet(text: &str) -> Result<Packet, PacketError> {
    let mut chars = text.chars();
    let engine_type = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match engine_type {
        '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
        '1' => Ok(Packet::Close),
        '2' => Ok(Packet::Ping),
        '3' => Ok(Packet::Pong),
        '4' => parse_socket_packet(rest),
        '5' | '6' => Ok(Packet::Ignored),
        other => Err(PacketError::UnknownType(other)),
    }
}

fn parse_socket_packet(text: &str) -> Result<Packet, PacketError> {
    let mut chars = text.chars();
    let socket_type = chars.next().ok_or(PacketError::Empty)?;
    let rest = chars.as_str();
    match socket_type {
        '0' => Ok(Packet::Connected),
        '1' => Ok(Packet::Disconnected),
        '2' => parse_event(rest).map(Packet::Event),
        '3' | '5' | '6' => Ok(Packet::Ignored),
        '4' => Ok(Packet::ConnectError(
            serde_json::from_str(rest).unwrap_or(serde_json::Value::Null),
        )),
        other => Err(PacketError::UnknownType(other)),
    }
}

/// Decode `["name", payload]`, skipping an optional leading ack id.
fn parse_event(text: &str) -> Result<ChannelEvent, PacketError> {
    let body = text.trim_start_matches(|c: char| c.is_ascii_digit());
    let values: Vec<serde_json::Value> = serde_json::from_str(body)?;
    let mut values = values.into_iter();

    let name = match values.next() {
        Some(serde_json::Value::String(name)) => name,
        _ => return Err(PacketError::Malformed("event name missing".into())),
    };
    let payload = values.next().unwrap_or(serde_json::Value::Null);

    match EventName::from_str(&name) {
        Some(EventName::ResultUpdate) => {
            Ok(ChannelEvent::ResultUpdate(serde_json::from_value(payload)?))
        }
        Some(EventName::DrawRequest) => Ok(ChannelEvent::DrawRequest(payload)),
        None => Err(PacketError::UnknownEvent(name)),
    }
}
