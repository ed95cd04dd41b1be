//! Realtime Channel Module
//!
//! The bidirectional connection attached to an active interview session:
//! - Single connection keyed by conversation id
//! - Connection-stamped events (open/message/error/close)
//! - No automatic reconnection

pub mod error;
pub mod state;
pub mod transport;
pub mod websocket;

pub use error::ChannelError;
pub use state::{ChannelEvent, ChannelEventKind, ChannelPayload, ChannelState, ConnectionId};
pub use transport::RealtimeChannel;
pub use websocket::{ChannelEvents, WebSocketChannel};
