//! Bounded fire-and-forget forwarding.
//!
//! Each accepted event runs in its own task holding one semaphore permit.
//! When every permit is taken the event is dropped and counted; nothing is
//! queued, retried, or persisted. Each outcome is kept in [`ForwardStats`]
//! for the shutdown summary and recorded as `vabridge_forward_events_total`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Semaphore;
use tracing::{debug, warn};
use vabridge_core::EventRecord;
use vabridge_core::metrics::FORWARD_EVENTS_TOTAL;
use vabridge_settings::BodySettings;

use crate::errors::ForwardError;
use crate::frame::FrameCodec;
use crate::message::{ForwardMessage, compact_timestamp};
use crate::sink::ForwardSink;

/// Delivery counters.
#[derive(Debug, Default)]
pub struct ForwardStats {
    submitted: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    delivered: AtomicU64,
}

impl ForwardStats {
    /// Events accepted into the pool.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Events rejected because the pool was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Accepted events whose delivery failed.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Accepted events delivered to the sink.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}

fn record(counter: &AtomicU64, outcome: &'static str) {
    let _ = counter.fetch_add(1, Ordering::Relaxed);
    metrics::counter!(FORWARD_EVENTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Runs at most `max_in_flight` deliveries at once.
pub struct ForwardPool {
    codec: FrameCodec,
    body: BodySettings,
    sink: Arc<dyn ForwardSink>,
    permits: Arc<Semaphore>,
    max_in_flight: usize,
    stats: Arc<ForwardStats>,
}

impl ForwardPool {
    /// Create a pool.
    pub fn new(
        codec: FrameCodec,
        body: BodySettings,
        sink: Arc<dyn ForwardSink>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            codec,
            body,
            sink,
            permits: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
            stats: Arc::new(ForwardStats::default()),
        }
    }

    /// Shared counters.
    pub fn stats(&self) -> Arc<ForwardStats> {
        Arc::clone(&self.stats)
    }

    /// Deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.permits.available_permits()
    }

    /// Forward one event without waiting for delivery.
    ///
    /// Returns `false` if the event was dropped (pool full or the message
    /// could not be built).
    pub fn submit(&self, event: &EventRecord) -> bool {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            record(&self.stats.dropped, "dropped");
            warn!(
                event_id = %event.id,
                in_flight = self.max_in_flight,
                "forward pool full, dropping event"
            );
            return false;
        };

        let frame = match self.build_frame() {
            Ok(frame) => frame,
            Err(error) => {
                record(&self.stats.failed, "failed");
                warn!(event_id = %event.id, %error, "failed to build forward frame");
                return false;
            }
        };

        record(&self.stats.submitted, "submitted");
        let sink = Arc::clone(&self.sink);
        let stats = Arc::clone(&self.stats);
        let event_id = event.id.clone();
        drop(tokio::spawn(async move {
            match sink.send(frame).await {
                Ok(()) => {
                    record(&stats.delivered, "delivered");
                    debug!(%event_id, "event forwarded");
                }
                Err(error) => {
                    record(&stats.failed, "failed");
                    warn!(%event_id, %error, "event forward failed");
                }
            }
            drop(permit);
        }));
        true
    }

    fn build_frame(&self) -> Result<bytes::Bytes, ForwardError> {
        let timestamp = compact_timestamp();
        let body = ForwardMessage::new(&self.body, &timestamp).to_bytes()?;
        Ok(self.codec.frame_at(&body, &timestamp)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
