//! Session Events
//!
//! Notifications published to the presentation layer.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::error::SessionError;
use super::state::SessionPhase;
use crate::channel::ChannelPayload;

/// Events published by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    /// Phase changed
    PhaseChanged {
        old_phase: SessionPhase,
        new_phase: SessionPhase,
    },

    /// An operation failed
    Error { error: SessionError },

    /// Realtime channel finished its handshake
    ChannelOpened { conversation_id: String },

    /// Data received on the realtime channel
    ChannelMessage {
        conversation_id: String,
        payload: ChannelPayload,
    },

    /// Realtime channel ended
    ChannelClosed {
        conversation_id: String,
        code: u16,
        reason: String,
    },
}

impl SessionEvent {
    /// Event name for presentation routing
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PhaseChanged { .. } => "session-phase",
            Self::Error { .. } => "session-error",
            Self::ChannelOpened { .. } => "channel-open",
            Self::ChannelMessage { .. } => "channel-message",
            Self::ChannelClosed { .. } => "channel-close",
        }
    }
}

/// Fan-out of session events to any number of subscribers
#[derive(Debug, Clone)]
pub struct SessionEventEmitter {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEventEmitter {
    /// Create an emitter buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; having no subscribers is not an error
    pub fn emit(&self, event: SessionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn emit_phase(&self, old_phase: SessionPhase, new_phase: SessionPhase) {
        self.emit(SessionEvent::PhaseChanged { old_phase, new_phase });
    }

    pub fn emit_error(&self, error: SessionError) {
        self.emit(SessionEvent::Error { error });
    }
}

impl Default for SessionEventEmitter {
    fn default() -> Self {
        Self::new(256)
    }
}
