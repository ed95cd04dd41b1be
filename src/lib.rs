//! Interview session lifecycle controller.
//!
//! Creates interview sessions on a remote service, attaches the realtime
//! channel of each session, and cancels them, keeping phase, channel and
//! session identity in step.

pub mod channel;
pub mod config;
pub mod service;
pub mod session;

pub use channel::{RealtimeChannel, WebSocketChannel};
pub use config::ClientSettings;
pub use service::{HttpSessionService, SessionService};
pub use session::{SessionConfig, SessionController, SessionError, SessionEvent, SessionPhase};
