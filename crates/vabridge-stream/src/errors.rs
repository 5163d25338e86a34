//! Connection error types.

use std::sync::Arc;
use std::time::Duration;

use tokio_tungstenite::tungstenite;

/// Failure to establish the connection. Never retried at this layer.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// URL or header could not form a valid handshake request.
    #[error("invalid subscription request: {0}")]
    InvalidRequest(String),

    /// Transport, TLS, or upgrade handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(#[source] Box<tungstenite::Error>),

    /// The handshake did not finish in time.
    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),

    /// Cancelled before the handshake finished.
    #[error("connect cancelled")]
    Cancelled,

    /// `connect` was called on a connection that was already used.
    #[error("connection already used")]
    AlreadyUsed,
}

/// Failure on an established connection. Always terminal.
///
/// Cloneable so the same cause can be returned to a writer and reported in
/// [`StreamEvent::Disconnected`](crate::StreamEvent::Disconnected).
#[derive(Clone, Debug, thiserror::Error)]
pub enum StreamError {
    /// Reading the next frame failed.
    #[error("read failed: {0}")]
    Read(#[source] Arc<tungstenite::Error>),

    /// Writing a frame failed.
    #[error("write failed: {0}")]
    Write(#[source] Arc<tungstenite::Error>),

    /// No frame arrived within the read timeout.
    #[error("no frame within {0:?}")]
    ReadTimeout(Duration),

    /// The peer ended the stream.
    #[error("closed by peer")]
    PeerClosed,

    /// The connection is not (or no longer) open.
    #[error("not connected")]
    NotConnected,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
