//! Error types for the transport module.

use thiserror::Error;

use crate::native::SocketErrorCode;

/// Errors that can occur during transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The session could not be created.
    #[error("Session setup failed: {0}")]
    Setup(String),

    /// Invalid RTMP URL.
    #[error("Invalid RTMP URL: {0}")]
    InvalidUrl(String),

    /// TCP connect or handshake failed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// No answer from the server within the response deadline.
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// The server rejected the connect or publish request.
    #[error("Rejected by server: {0}")]
    Rejected(String),

    /// Send error.
    #[error("Send error: {0}")]
    Send(String),

    /// Reconnect exhausted.
    #[error("Reconnect attempts exhausted after {0} attempts")]
    ReconnectExhausted(u32),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// The native error code a session reports for this failure.
    pub fn socket_error_code(&self) -> SocketErrorCode {
        match self {
            Self::Setup(_) => SocketErrorCode::Preview,
            Self::InvalidUrl(_) => SocketErrorCode::GetStreamInfo,
            Self::Rejected(_) => SocketErrorCode::Verification,
            Self::ReconnectExhausted(_) => SocketErrorCode::ReconnectTimeout,
            Self::Connection(_) | Self::Timeout(_) | Self::Send(_) | Self::Io(_) => {
                SocketErrorCode::ConnectSocket
            }
        }
    }
}
