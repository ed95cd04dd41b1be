//! Channel State and Events
//!
//! Connection state owned by the adapter and the events it reports.

use serde::{Deserialize, Serialize};

/// Identifies one connection attempt made by an adapter.
///
/// Every event is stamped with the id of the connection that produced it so
/// consumers can drop events from connections they no longer care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// State of the realtime connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelState {
    /// No connection has been made yet
    #[default]
    Disconnected,
    /// Handshake in progress
    Connecting,
    /// Connection established
    Open,
    /// Connection ended (locally or by the remote)
    Closed,
    /// Transport reported an error; the connection may still be alive
    Errored,
}

impl std::fmt::Display for ChannelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Errored => write!(f, "errored"),
        }
    }
}

/// Opaque message received on the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ChannelPayload {
    Text(String),
    Binary(Vec<u8>),
}

/// Event emitted by a realtime channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Connection that produced the event
    pub connection: ConnectionId,
    pub kind: ChannelEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// Handshake completed
    Open,
    /// Data from the remote
    Message(ChannelPayload),
    /// Transport error
    Error(String),
    /// Connection ended
    Closed { code: u16, reason: String },
}

impl ChannelEvent {
    pub fn new(connection: ConnectionId, kind: ChannelEventKind) -> Self {
        Self { connection, kind }
    }

    /// The channel state this event moves the connection into, if any
    pub fn resulting_state(&self) -> Option<ChannelState> {
        match self.kind {
            ChannelEventKind::Open => Some(ChannelState::Open),
            ChannelEventKind::Message(_) => None,
            ChannelEventKind::Error(_) => Some(ChannelState::Errored),
            ChannelEventKind::Closed { .. } => Some(ChannelState::Closed),
        }
    }
}
