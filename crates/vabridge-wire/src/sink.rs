//! Downstream aggregation sink.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;
use vabridge_settings::ForwardSettings;

use crate::errors::ForwardError;

/// Accepts one framed message per call.
#[async_trait]
pub trait ForwardSink: Send + Sync {
    /// Deliver one frame. No response is expected.
    async fn send(&self, frame: Bytes) -> Result<(), ForwardError>;
}

/// Opens a fresh TCP connection per frame, writes it, and closes.
#[derive(Clone, Debug)]
pub struct TcpSink {
    address: String,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpSink {
    /// Create a sink for `host:port`.
    pub fn new(address: impl Into<String>, connect_timeout: Duration, write_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
            write_timeout,
        }
    }

    /// Build from forward settings.
    pub fn from_settings(settings: &ForwardSettings) -> Self {
        Self::new(
            settings.sink_address.clone(),
            settings.connect_timeout(),
            settings.write_timeout(),
        )
    }
}

#[async_trait]
impl ForwardSink for TcpSink {
    async fn send(&self, frame: Bytes) -> Result<(), ForwardError> {
        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| ForwardError::Timeout {
                stage: "connect",
                timeout: self.connect_timeout,
            })?
            .map_err(ForwardError::Connect)?;

        let write = async {
            stream.write_all(&frame).await?;
            stream.shutdown().await
        };
        tokio::time::timeout(self.write_timeout, write)
            .await
            .map_err(|_| ForwardError::Timeout {
                stage: "write",
                timeout: self.write_timeout,
            })?
            .map_err(ForwardError::Write)?;

        debug!(address = %self.address, bytes = frame.len(), "frame delivered");
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
