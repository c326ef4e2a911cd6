//! Network error types.

use thiserror::Error;

/// Network errors.
///
/// Carried inside [`crate::PeerGroupEvent::OnPeerDisconnect`], hence `Clone`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection closed by the remote side.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Handshake failed.
    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    /// Invalid message.
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Peer misbehaved and was dropped.
    #[error("Peer misbehaved: {0}")]
    Misbehavior(String),

    /// Timeout.
    #[error("Timeout: {0}")]
    Timeout(String),
}

/// Result type for network operations.
pub type NetworkResult<T> = Result<T, NetworkError>;
