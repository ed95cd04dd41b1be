//! Realtime Channel Abstraction
//!
//! The controller commands the channel; the channel reports back only
//! through its event stream.

use super::state::{ChannelState, ConnectionId};

/// A single bidirectional connection keyed by session identity.
///
/// Implementations must not block: `connect` starts the handshake in the
/// background and reports progress as events.
pub trait RealtimeChannel: Send + Sync {
    /// Open a connection addressed by `key`.
    ///
    /// If a connection for a different key is live this is a no-op that
    /// emits an `Error` event stamped with the returned id. Reconnecting with
    /// the live key returns the existing connection's id.
    fn connect(&self, key: &str) -> ConnectionId;

    /// Close any open or connecting connection. No-op when nothing is live.
    fn disconnect(&self);

    /// Current connection state
    fn state(&self) -> ChannelState;

    /// Channel type name for logging
    fn channel_type(&self) -> &'static str;
}
