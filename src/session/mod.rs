//! Session Management Module
//!
//! Single-session lifecycle control:
//! - Input validation and the re-entrancy guards
//! - Creation and cancellation through the interview service
//! - Realtime channel attach/teardown keyed by conversation id
//! - Phase and channel notifications for the presentation layer

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod state;

pub use config::SessionConfig;
pub use controller::{ControllerOptions, SessionController};
pub use error::{SessionError, SessionResult};
pub use events::{SessionEvent, SessionEventEmitter};
pub use state::{SessionHandle, SessionPhase, SessionSnapshot};
