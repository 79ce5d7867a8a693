//! Error types for reader service communication.

use std::net::SocketAddr;
use tokio_tungstenite::tungstenite;

/// Result type alias for network operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while talking to the reader service.
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// Connection attempt timed out.
    #[error("Connection timeout after {0}ms")]
    ConnectTimeout(u64),

    /// No card message arrived in time.
    #[error("Response timeout after {0}ms")]
    ResponseTimeout(u64),

    /// Service refused or failed the connection.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection dropped while reading.
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// WebSocket protocol violation.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Emulator could not bind its listener.
    #[error("Failed to bind to {0}")]
    BindFailed(SocketAddr),

    /// Endpoint or configuration problem.
    #[error(transparent)]
    Config(#[from] cardlink_core::Error),

    /// Low-level I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Create a new connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a new connection lost error.
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost(message.into())
    }

    /// Create a new protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether the error is a timeout of any kind.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConnectTimeout(_) | Self::ResponseTimeout(_))
    }
}

impl From<tungstenite::Error> for ReaderError {
    fn from(error: tungstenite::Error) -> Self {
        use tungstenite::Error as WsError;

        match error {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                Self::connection_lost("connection closed")
            }
            WsError::Io(e) => Self::Io(e),
            WsError::Http(response) => {
                Self::connection_failed(format!("handshake rejected with {}", response.status()))
            }
            WsError::Url(e) => Self::connection_failed(e.to_string()),
            other => Self::protocol(other.to_string()),
        }
    }
}
