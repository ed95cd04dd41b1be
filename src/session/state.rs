//! Session State Management
//!
//! Lifecycle phase of the controller and the handle of the live session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::{ChannelState, ConnectionId};

/// Lifecycle phase of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    /// No session; ready to start
    #[default]
    Idle,
    /// Creation request in flight
    Starting,
    /// Session created and channel attached
    Active,
    /// Channel torn down, cancellation request in flight
    Canceling,
}

impl SessionPhase {
    /// Whether `cancel_session` has something to cancel in this phase
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::Starting | Self::Active)
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Active => write!(f, "active"),
            Self::Canceling => write!(f, "canceling"),
        }
    }
}

/// Identity of a created session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    /// Conversation id returned by the service; the channel key
    pub conversation_id: String,
    /// Last channel state reported by the adapter
    pub channel_state: ChannelState,
    /// Adapter connection this session's events are stamped with
    pub connection: ConnectionId,
    pub started_at: DateTime<Utc>,
}

impl SessionHandle {
    pub fn new(conversation_id: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            channel_state: ChannelState::Connecting,
            connection,
            started_at: Utc::now(),
        }
    }

    /// Seconds since the session was created
    pub fn duration_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

/// Serializable view of the controller for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub conversation_id: Option<String>,
    pub channel_state: Option<ChannelState>,
    pub started_at: Option<String>,
    pub duration_secs: Option<i64>,
}

impl SessionSnapshot {
    pub fn new(phase: SessionPhase, handle: Option<&SessionHandle>) -> Self {
        Self {
            phase,
            conversation_id: handle.map(|h| h.conversation_id.clone()),
            channel_state: handle.map(|h| h.channel_state),
            started_at: handle.map(|h| h.started_at.to_rfc3339()),
            duration_secs: handle.map(|h| h.duration_secs()),
        }
    }
}
