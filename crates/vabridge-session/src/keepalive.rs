//! Keepalive supervision for one session attempt.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use vabridge_auth::{AuthError, Authenticator};
use vabridge_core::Credential;
use vabridge_core::metrics::KEEPALIVE_FAILURES_TOTAL;

/// Outcome of the keepalive loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveResult {
    /// A probe failed; the fatal signal was sent.
    Failed,
    /// The attempt was cancelled externally.
    Cancelled,
}

/// Probe `credential` every `interval` until a probe fails or `cancel` fires.
///
/// The first tick is one full interval after start. On failure the error is
/// sent on `fatal` and the loop stops; `fatal` is consumed, so at most one
/// signal is ever sent. Cancellation, including during an in-flight probe,
/// stops silently.
pub async fn run_keepalive(
    authenticator: Arc<dyn Authenticator>,
    credential: Credential,
    interval: Duration,
    cancel: CancellationToken,
    fatal: oneshot::Sender<AuthError>,
) -> KeepaliveResult {
    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => return KeepaliveResult::Cancelled,
            _ = ticker.tick() => {}
        }

        let outcome = tokio::select! {
            () = cancel.cancelled() => return KeepaliveResult::Cancelled,
            outcome = authenticator.probe(&credential) => outcome,
        };

        match outcome {
            Ok(()) => debug!("keepalive ok"),
            Err(error) => {
                let kind = if error.is_transport() {
                    warn!(%error, "keepalive unreachable, session is invalid");
                    "transport"
                } else {
                    warn!(%error, "keepalive rejected, session is invalid");
                    "rejected"
                };
                metrics::counter!(KEEPALIVE_FAILURES_TOTAL, "kind" => kind).increment(1);
                let _ = fatal.send(error);
                return KeepaliveResult::Failed;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
