//! Session Error Types
//!
//! Everything the controller can report to its caller. All variants are
//! recoverable: after any of them the controller is `Idle` or unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionError {
    /// Required configuration fields are empty
    #[error("Missing required field(s): {}", .missing.join(", "))]
    Validation { missing: Vec<String> },

    /// A session is already starting or running
    #[error("A session is already in progress")]
    AlreadyActive,

    /// Cancel was requested with nothing to cancel
    #[error("No active session to cancel")]
    NoActiveSession,

    /// The service rejected or failed the creation request
    #[error("Failed to start session: {reason}")]
    StartFailed { reason: String },

    /// The service failed the cancellation request; local state was still cleared
    #[error("Session cancelled locally, server cleanup may be incomplete: {reason}")]
    CancelFailed { reason: String },

    /// The realtime channel reported an error
    #[error("Channel error: {cause}")]
    ChannelError { cause: String },

    /// The start attempt was cancelled before it completed
    #[error("Session start was cancelled")]
    Cancelled,
}

impl SessionError {
    pub fn start_failed(reason: impl Into<String>) -> Self {
        Self::StartFailed { reason: reason.into() }
    }

    pub fn cancel_failed(reason: impl Into<String>) -> Self {
        Self::CancelFailed { reason: reason.into() }
    }

    pub fn channel(cause: impl Into<String>) -> Self {
        Self::ChannelError { cause: cause.into() }
    }

    /// Short stable code for logging and presentation
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::AlreadyActive => "already_active",
            Self::NoActiveSession => "no_active_session",
            Self::StartFailed { .. } => "start_failed",
            Self::CancelFailed { .. } => "cancel_failed",
            Self::ChannelError { .. } => "channel_error",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result type alias for controller operations
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_lists_fields() {
        let err = SessionError::Validation {
            missing: vec!["agentId".to_string(), "apiKey".to_string()],
        };
        assert_eq!(err.to_string(), "Missing required field(s): agentId, apiKey");
        assert_eq!(err.code(), "validation");
    }

    #[test]
    fn test_error_serialization() {
        let json = serde_json::to_value(SessionError::start_failed("bad agent")).unwrap();
        assert_eq!(json["kind"], "startFailed");
        assert_eq!(json["reason"], "bad agent");
    }
}
