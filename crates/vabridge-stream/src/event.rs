//! Connection lifecycle and inbound events.

use bytes::Bytes;

use crate::errors::StreamError;

/// Lifecycle of a [`StreamingConnection`](crate::StreamingConnection).
///
/// Moves strictly `Disconnected → Connecting → Connected → Disconnected`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected (initial and terminal).
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Handshake done; read loop running.
    Connected,
}

/// Everything a connection reports, in order.
#[derive(Debug)]
pub enum StreamEvent {
    /// Handshake succeeded.
    Connected,
    /// Handshake failed. The connection is finished.
    ConnectFailed(String),
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Bytes),
    /// Ping received (the pong is sent automatically).
    Ping(Bytes),
    /// Pong received.
    Pong(Bytes),
    /// The connection ended. `None` when closed locally.
    Disconnected(Option<StreamError>),
}

impl StreamEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ConnectFailed(_) => "connect_failed",
            Self::Text(_) => "text",
            Self::Binary(_) => "binary",
            Self::Ping(_) => "ping",
            Self::Pong(_) => "pong",
            Self::Disconnected(_) => "disconnected",
        }
    }
}
