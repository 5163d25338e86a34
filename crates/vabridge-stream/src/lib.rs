//! # vabridge-stream
//!
//! One WebSocket subscription to the appliance.
//!
//! A [`StreamingConnection`] is used exactly once: `connect`, stream events,
//! then `close` (or fail). Everything it observes is delivered as a
//! [`StreamEvent`] on a single channel, in network arrival order, so the
//! consumer can correlate a metadata text frame with the image that follows.
//!
//! ```text
//! connect ─▶ Connected ─▶ Text / Binary / Ping / Pong ... ─▶ Disconnected
//!        └─▶ ConnectFailed
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod errors;
pub mod event;
pub mod tls;

pub use config::ConnectionConfig;
pub use connection::StreamingConnection;
pub use errors::{ConnectError, StreamError};
pub use event::{ConnectionState, StreamEvent};
