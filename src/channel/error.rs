//! Channel Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Already connected to {0}")]
    AlreadyConnected(String),

    #[error("Invalid channel endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Connect timeout after {0}ms")]
    ConnectTimeout(u64),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for ChannelError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;
        match err {
            WsError::Url(e) => ChannelError::InvalidEndpoint(e.to_string()),
            WsError::Io(e) => ChannelError::ConnectFailed(e.to_string()),
            other => ChannelError::Transport(other.to_string()),
        }
    }
}

impl From<url::ParseError> for ChannelError {
    fn from(err: url::ParseError) -> Self {
        ChannelError::InvalidEndpoint(err.to_string())
    }
}
