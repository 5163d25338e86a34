//! Process-wide cancellation via `CancellationToken`.
//!
//! The root token is cancelled on SIGINT/SIGTERM. Each session attempt runs
//! under a child token, so cancelling the root stops the read loop and the
//! keepalive supervisor of the current attempt as well.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default grace period before in-flight work is abandoned.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Coordinates shutdown across all tasks.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Root cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Cancel the root token and wait up to `grace` for `handles`.
    ///
    /// Returns `true` if every task finished inside the grace period. Tasks
    /// still running afterwards are aborted.
    pub async fn graceful_shutdown(
        &self,
        handles: Vec<JoinHandle<()>>,
        grace: Option<Duration>,
    ) -> bool {
        let grace = grace.unwrap_or(DEFAULT_GRACE_PERIOD);

        self.shutdown();
        info!(
            task_count = handles.len(),
            grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX),
            "waiting for tasks to finish"
        );

        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
        let drain = futures::future::join_all(handles);

        if tokio::time::timeout(grace, drain).await.is_err() {
            warn!("grace period of {grace:?} elapsed, abandoning in-flight work");
            for handle in aborts {
                handle.abort();
            }
            return false;
        }
        true
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_token_starts_live() {
        let coord = ShutdownCoordinator::new();
        assert!(!coord.token().is_cancelled());
    }

    #[test]
    fn shutdown_is_idempotent() {
        let coord = ShutdownCoordinator::new();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.token().is_cancelled());
    }

    #[test]
    fn attempt_tokens_follow_root() {
        let coord = ShutdownCoordinator::new();
        let attempt = coord.token().child_token();
        coord.shutdown();
        assert!(attempt.is_cancelled());
    }

    #[test]
    fn cancelling_attempt_leaves_root_alone() {
        let coord = ShutdownCoordinator::new();
        let attempt = coord.token().child_token();
        attempt.cancel();
        assert!(!coord.token().is_cancelled());
    }

    #[tokio::test]
    async fn graceful_shutdown_awaits_cooperative_tasks() {
        let coord = ShutdownCoordinator::new();
        let token = coord.token();
        let handle = tokio::spawn(async move {
            token.cancelled().await;
        });

        assert!(coord.graceful_shutdown(vec![handle], None).await);
    }

    #[tokio::test(start_paused = true)]
    async fn graceful_shutdown_gives_up_after_grace() {
        let coord = ShutdownCoordinator::new();
        let handle = tokio::spawn(async {
            tokio::time::sleep(Duration::from_secs(300)).await;
        });

        let finished = coord
            .graceful_shutdown(vec![handle], Some(Duration::from_millis(100)))
            .await;
        assert!(!finished);
    }
}
