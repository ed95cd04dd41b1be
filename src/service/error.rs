//! Interview Service Error Types
//!
//! Errors raised while talking to the remote interview service over HTTP.

use thiserror::Error;

/// Errors from the `/offer` and `/cancel` endpoints
#[derive(Error, Debug)]
pub enum ServiceError {
    // Transport errors
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    TimedOut,

    #[error("Transport error: {0}")]
    Transport(String),

    // Protocol errors
    #[error("HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ServiceError {
    /// Human-readable reason suitable for showing to the user.
    ///
    /// A rejection carries the service's own `error` text verbatim; every
    /// other variant falls back to its display form.
    pub fn reason(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::TimedOut
        } else if err.is_connect() {
            ServiceError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            ServiceError::InvalidResponse(err.to_string())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::InvalidResponse(err.to_string())
    }
}

impl From<url::ParseError> for ServiceError {
    fn from(err: url::ParseError) -> Self {
        ServiceError::InvalidConfig(format!("Invalid URL: {}", err))
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_reason_is_service_text() {
        let err = ServiceError::Rejected {
            status: 400,
            message: "bad agent".to_string(),
        };
        assert_eq!(err.reason(), "bad agent");
        assert_eq!(err.to_string(), "HTTP 400: bad agent");
    }

    #[test]
    fn test_other_reasons_use_display() {
        let err = ServiceError::InvalidResponse("missing conversationId".to_string());
        assert_eq!(err.reason(), "Invalid response: missing conversationId");
    }
}
