//! Session orchestrator.
//!
//! One attempt = one credential + one connection + one keepalive supervisor,
//! all under a child of the shutdown token and torn down together.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vabridge_auth::{AuthError, Authenticator};
use vabridge_core::Credential;
use vabridge_core::metrics::{AUTH_FAILURES_TOTAL, SESSION_ATTEMPTS_TOTAL, SESSION_RESTARTS_TOTAL};
use vabridge_settings::{ApplianceSettings, BridgeSettings};
use vabridge_stream::{ConnectionConfig, StreamingConnection};

use crate::keepalive::{KeepaliveResult, run_keepalive};
use crate::pipeline::{EventPipeline, PipelineExit};

/// Where the orchestrator is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// Obtaining a credential.
    Authenticating,
    /// Opening the subscription.
    Connecting,
    /// Subscription open, keepalive running.
    Active,
    /// Tearing the attempt down.
    Draining,
    /// About to start a new attempt.
    Restarting,
    /// Shut down; `run` has returned.
    Stopped,
}

/// Explicit configuration for [`Orchestrator`].
#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Endpoint and connection options.
    pub appliance: ApplianceSettings,
    /// Probe interval.
    pub keepalive_interval: Duration,
    /// Wait after a failed login.
    pub auth_backoff: Duration,
    /// Wait after a failed or lost connection.
    pub reconnect_delay: Duration,
    /// Inbound event channel capacity.
    pub event_buffer: usize,
}

impl OrchestratorConfig {
    /// Take the session-relevant parts of the loaded settings.
    pub fn from_settings(settings: &BridgeSettings) -> Self {
        Self {
            appliance: settings.appliance.clone(),
            keepalive_interval: settings.session.keepalive_interval(),
            auth_backoff: settings.session.auth_backoff(),
            reconnect_delay: settings.session.reconnect_delay(),
            event_buffer: settings.session.event_buffer.max(1),
        }
    }
}

/// What ended an attempt.
#[derive(Debug)]
enum DrainCause {
    Shutdown,
    KeepaliveFailed(AuthError),
    ConnectFailed(String),
    ConnectionLost(PipelineExit),
}

impl DrainCause {
    /// Label for the restart counter; `None` when the attempt ended for shutdown.
    fn restart_label(&self) -> Option<&'static str> {
        match self {
            Self::Shutdown => None,
            Self::KeepaliveFailed(_) => Some("keepalive"),
            Self::ConnectFailed(_) => Some("connect_failed"),
            Self::ConnectionLost(_) => Some("connection_lost"),
        }
    }
}

/// Drives authenticate → connect → supervise → restart until shutdown.
pub struct Orchestrator {
    config: OrchestratorConfig,
    authenticator: Arc<dyn Authenticator>,
    pipeline: Arc<EventPipeline>,
    state: watch::Sender<SessionState>,
    attempts: AtomicU64,
}

impl Orchestrator {
    /// Create an orchestrator. Nothing happens until [`run`](Self::run).
    pub fn new(
        config: OrchestratorConfig,
        authenticator: Arc<dyn Authenticator>,
        pipeline: Arc<EventPipeline>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            config,
            authenticator,
            pipeline,
            state,
            attempts: AtomicU64::new(0),
        }
    }

    /// Observe state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Connection attempts started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    fn set_state(&self, next: SessionState) {
        let _ = self.state.send_replace(next);
        info!(state = ?next, "session state");
    }

    /// Run until `shutdown` is cancelled.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            self.set_state(SessionState::Authenticating);
            let Some(credential) = self.authenticate(&shutdown).await else {
                break;
            };

            let cause = self.attempt(credential, &shutdown).await;
            if let Some(label) = cause.restart_label() {
                metrics::counter!(SESSION_RESTARTS_TOTAL, "cause" => label).increment(1);
            }
            match &cause {
                DrainCause::Shutdown => break,
                DrainCause::KeepaliveFailed(error) => {
                    warn!(%error, "keepalive failed, restarting session");
                }
                DrainCause::ConnectFailed(reason) => {
                    warn!(%reason, "subscription failed, restarting session");
                }
                DrainCause::ConnectionLost(exit) => {
                    warn!(?exit, "subscription lost, restarting session");
                }
            }

            self.set_state(SessionState::Restarting);
            if matches!(
                cause,
                DrainCause::ConnectFailed(_) | DrainCause::ConnectionLost(_)
            ) && !self.pause(self.config.reconnect_delay, &shutdown).await
            {
                break;
            }
        }
        self.set_state(SessionState::Stopped);
    }

    /// Log in, retrying after `auth_backoff`. `None` on shutdown.
    async fn authenticate(&self, shutdown: &CancellationToken) -> Option<Credential> {
        let appliance = &self.config.appliance;
        loop {
            let result = tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                result = self.authenticator.authenticate(&appliance.identity, &appliance.secret) => result,
            };
            match result {
                Ok(credential) => return Some(credential),
                Err(error) => {
                    metrics::counter!(AUTH_FAILURES_TOTAL).increment(1);
                    warn!(
                        %error,
                        backoff_secs = self.config.auth_backoff.as_secs(),
                        "authentication failed, backing off"
                    );
                    if !self.pause(self.config.auth_backoff, shutdown).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Sleep unless shut down first. Returns `false` on shutdown.
    async fn pause(&self, delay: Duration, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }

    /// One full attempt: connect, supervise, drain.
    #[tracing::instrument(skip_all, fields(attempt, credential = %credential.redacted()))]
    async fn attempt(&self, credential: Credential, shutdown: &CancellationToken) -> DrainCause {
        let attempt = self.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        metrics::counter!(SESSION_ATTEMPTS_TOTAL).increment(1);
        let _ = tracing::Span::current().record("attempt", attempt);
        self.set_state(SessionState::Connecting);

        let token = shutdown.child_token();
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer);
        let connection = StreamingConnection::new(
            ConnectionConfig::subscription(&self.config.appliance, &credential),
            events_tx,
        );
        let mut pipeline = tokio::spawn(Arc::clone(&self.pipeline).run(events_rx));

        let (fatal_tx, mut fatal_rx) = oneshot::channel();
        let keepalive = tokio::spawn(run_keepalive(
            Arc::clone(&self.authenticator),
            credential,
            self.config.keepalive_interval,
            token.clone(),
            fatal_tx,
        ));

        let mut pipeline_done = false;
        let cause = match connection.connect(token.clone()).await {
            Err(error) => DrainCause::ConnectFailed(error.to_string()),
            Ok(()) => {
                self.set_state(SessionState::Active);
                tokio::select! {
                    biased;
                    () = shutdown.cancelled() => DrainCause::Shutdown,
                    Ok(error) = &mut fatal_rx => DrainCause::KeepaliveFailed(error),
                    exit = &mut pipeline => {
                        pipeline_done = true;
                        match exit {
                            Ok(exit) => DrainCause::ConnectionLost(exit),
                            Err(error) => {
                                warn!(%error, "event pipeline task failed");
                                DrainCause::ConnectionLost(PipelineExit::ChannelClosed)
                            }
                        }
                    }
                }
            }
        };
        let cause = if shutdown.is_cancelled() {
            DrainCause::Shutdown
        } else {
            cause
        };

        self.set_state(SessionState::Draining);
        connection.close().await;
        token.cancel();
        drop(connection);
        match keepalive.await {
            Ok(KeepaliveResult::Failed) => debug!("keepalive stopped after a failed probe"),
            Ok(KeepaliveResult::Cancelled) => debug!("keepalive cancelled"),
            Err(error) => warn!(%error, "keepalive task failed"),
        }
        if !pipeline_done {
            let _ = pipeline.await;
        }
        cause
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use bytes::Bytes;
    use vabridge_core::ImageName;

    use super::*;
    use crate::errors::PersistError;
    use crate::images::ImageStore;

    #[derive(Default)]
    struct CountingAuth {
        logins: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for CountingAuth {
        async fn authenticate(&self, _: &str, _: &str) -> Result<Credential, AuthError> {
            let _ = self.logins.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::MissingCredential)
        }

        async fn probe(&self, _: &Credential) -> Result<(), AuthError> {
            Ok(())
        }
    }

    struct NullStore;

    #[async_trait]
    impl ImageStore for NullStore {
        async fn persist(&self, name: &ImageName, _: Bytes) -> Result<PathBuf, PersistError> {
            Ok(PathBuf::from(name.file_name()))
        }
    }

    fn orchestrator(auth: Arc<CountingAuth>, config: OrchestratorConfig) -> Orchestrator {
        let pipeline = Arc::new(EventPipeline::new(Arc::new(NullStore), None));
        Orchestrator::new(config, auth, pipeline)
    }

    #[test]
    fn config_from_default_settings() {
        let config = OrchestratorConfig::from_settings(&BridgeSettings::default());
        assert_eq!(config.keepalive_interval, Duration::from_secs(840));
        assert_eq!(config.auth_backoff, Duration::from_secs(30));
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert_eq!(config.event_buffer, 64);
        assert_eq!(config.appliance.subprotocol, "va-metadata");
    }

    #[test]
    fn starts_idle() {
        let orch = orchestrator(
            Arc::new(CountingAuth::default()),
            OrchestratorConfig::from_settings(&BridgeSettings::default()),
        );
        assert_eq!(orch.state(), SessionState::Idle);
        assert_eq!(orch.attempts(), 0);
    }

    #[tokio::test]
    async fn pre_cancelled_shutdown_stops_without_login() {
        let auth = Arc::new(CountingAuth::default());
        let orch = orchestrator(
            auth.clone(),
            OrchestratorConfig::from_settings(&BridgeSettings::default()),
        );
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        orch.run(shutdown).await;
        assert_eq!(orch.state(), SessionState::Stopped);
        assert_eq!(auth.logins.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_login_backs_off_before_retrying() {
        let auth = Arc::new(CountingAuth::default());
        let orch = Arc::new(orchestrator(
            auth.clone(),
            OrchestratorConfig::from_settings(&BridgeSettings::default()),
        ));
        let shutdown = CancellationToken::new();
        let run = tokio::spawn({
            let orch = Arc::clone(&orch);
            let shutdown = shutdown.clone();
            async move { orch.run(shutdown).await }
        });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(auth.logins.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(auth.logins.load(Ordering::SeqCst), 2);
        assert_eq!(orch.attempts(), 0);

        shutdown.cancel();
        run.await.unwrap();
        assert_eq!(orch.state(), SessionState::Stopped);
    }
}
