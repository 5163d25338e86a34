//! Inbound event dispatch for one connection.
//!
//! A metadata text frame names the image in the binary frame right behind
//! it. The pipeline consumes [`StreamEvent`]s strictly in order and hands the
//! pending [`ImageName`] to the image store explicitly, so a name can never
//! pair with any image other than the next one.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vabridge_core::metrics::IMAGES_TOTAL;
use vabridge_core::{EventRecord, ImageName};
use vabridge_stream::{StreamError, StreamEvent};
use vabridge_wire::ForwardPool;

use crate::images::ImageStore;

/// Why a pipeline run ended.
#[derive(Debug)]
pub enum PipelineExit {
    /// Handshake failed before any frame.
    ConnectFailed(String),
    /// The connection ended (`None` when closed locally).
    Disconnected(Option<StreamError>),
    /// The connection was dropped without reporting.
    ChannelClosed,
}

/// Routes inbound frames to image persistence and forwarding.
pub struct EventPipeline {
    images: Arc<dyn ImageStore>,
    forward: Option<Arc<ForwardPool>>,
}

impl EventPipeline {
    /// Create a pipeline. `forward` is `None` when forwarding is disabled.
    pub fn new(images: Arc<dyn ImageStore>, forward: Option<Arc<ForwardPool>>) -> Self {
        Self { images, forward }
    }

    /// Consume one connection's events until it ends.
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<StreamEvent>) -> PipelineExit {
        let mut pending: Option<ImageName> = None;

        while let Some(event) = events.recv().await {
            match event {
                StreamEvent::Connected => debug!("pipeline attached"),
                StreamEvent::ConnectFailed(reason) => return PipelineExit::ConnectFailed(reason),
                StreamEvent::Text(text) => pending = self.on_metadata(&text),
                StreamEvent::Binary(data) => self.on_image(pending.take(), data).await,
                StreamEvent::Ping(_) => debug!("ping"),
                StreamEvent::Pong(_) => debug!("pong"),
                StreamEvent::Disconnected(cause) => return PipelineExit::Disconnected(cause),
            }
        }
        PipelineExit::ChannelClosed
    }

    /// Parse a metadata frame, forward it, and return the image name it
    /// announces. Malformed frames are dropped and clear the pending name.
    fn on_metadata(&self, text: &str) -> Option<ImageName> {
        let record = match EventRecord::parse(text) {
            Ok(record) => record,
            Err(error) => {
                warn!(%error, len = text.len(), "dropping malformed metadata frame");
                return None;
            }
        };

        match record.category() {
            Some(category) => info!(
                code = record.code,
                %category,
                label = category.appliance_label(),
                id = %record.id,
                tm = %record.timestamp,
                "alarm"
            ),
            None => info!(
                code = record.code,
                id = %record.id,
                tm = %record.timestamp,
                "alarm with unknown type"
            ),
        }

        if let Some(pool) = &self.forward {
            let _ = pool.submit(&record);
        }
        Some(record.image_name())
    }

    async fn on_image(&self, name: Option<ImageName>, data: Bytes) {
        let Some(name) = name else {
            warn!(bytes = data.len(), "image frame without preceding metadata, dropping");
            metrics::counter!(IMAGES_TOTAL, "outcome" => "orphaned").increment(1);
            return;
        };
        match self.images.persist(&name, data).await {
            Ok(path) => {
                info!(image = %name, path = %path.display(), "image persisted");
                metrics::counter!(IMAGES_TOTAL, "outcome" => "saved").increment(1);
            }
            Err(error) => {
                warn!(image = %name, %error, "image persist failed");
                metrics::counter!(IMAGES_TOTAL, "outcome" => "failed").increment(1);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
