//! Error types for the Buildlog client

use buildlog_core::protocol::MessageError;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the channel server
#[derive(Debug, Error)]
pub enum ClientError {
    /// Websocket connect, read or write failed
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to decode an incoming frame
    #[error("Failed to decode frame: {0}")]
    Decode(#[from] MessageError),

    /// No reply arrived in time
    #[error("Timed out waiting for reply to {0}")]
    Timeout(String),

    /// The socket is closed; no more messages can be sent or received
    #[error("Socket closed")]
    SocketClosed,

    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error means the transport is gone for good
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::SocketClosed | Self::WebSocket(_))
    }
}
