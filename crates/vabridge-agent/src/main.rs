//! # vabridge-agent
//!
//! Bridge binary: loads settings, installs logging, then runs the session
//! orchestrator until SIGINT/SIGTERM.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use vabridge_auth::{AuthConfig, HttpAuthenticator};
use vabridge_core::{LogLevel, ShutdownCoordinator, init_subscriber};
use vabridge_session::{
    EventPipeline, JpegImageStore, Orchestrator, OrchestratorConfig, SessionState,
};
use vabridge_settings::BridgeSettings;
use vabridge_wire::{ForwardPool, FrameCodec, TcpSink};

/// Video-analytics alarm bridge.
#[derive(Parser, Debug)]
#[command(name = "vabridge-agent", about = "Video-analytics alarm bridge")]
struct Cli {
    /// Settings file (defaults to `~/.vabridge/settings.json`).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (overrides settings).
    #[arg(long)]
    log_level: Option<String>,

    /// Directory for saved alarm images (overrides settings).
    #[arg(long)]
    image_dir: Option<PathBuf>,

    /// Do not forward alarms to the aggregation sink.
    #[arg(long)]
    no_forward: bool,
}

impl Cli {
    /// Fold command-line overrides into loaded settings.
    fn apply(&self, settings: &mut BridgeSettings) {
        if let Some(ref level) = self.log_level {
            settings.logging.level = LogLevel::from_str_lossy(level);
        }
        if let Some(ref dir) = self.image_dir {
            settings.images.output_dir = dir.to_string_lossy().into_owned();
        }
        if self.no_forward {
            settings.forward.enabled = false;
        }
    }
}

fn load(cli: &Cli) -> Result<BridgeSettings> {
    let mut settings = match cli.config {
        Some(ref path) => vabridge_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => vabridge_settings::load_settings().context("Failed to load settings")?,
    };
    cli.apply(&mut settings);
    settings.validate().context("Invalid settings")?;
    Ok(settings)
}

/// Build the forward pool, or `None` when forwarding is disabled.
fn forward_pool(settings: &BridgeSettings) -> Result<Option<Arc<ForwardPool>>> {
    let forward = &settings.forward;
    if !forward.enabled {
        return Ok(None);
    }
    let codec = FrameCodec::new(&forward.header).context("Invalid frame header settings")?;
    let sink = Arc::new(TcpSink::from_settings(forward));
    Ok(Some(Arc::new(ForwardPool::new(
        codec,
        forward.body.clone(),
        sink,
        forward.max_in_flight,
    ))))
}

/// Install the global Prometheus recorder for the counters the crates emit.
fn install_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")
}

/// Log every state change until the orchestrator stops.
fn spawn_state_logger(mut states: watch::Receiver<SessionState>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = *states.borrow_and_update();
            tracing::debug!(?state, "session transition");
            if state == SessionState::Stopped {
                break;
            }
        }
    })
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                let _ = sig.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = load(&cli)?;
    init_subscriber(settings.logging.level, settings.logging.format);
    let metrics = install_metrics()?;

    tracing::info!(
        appliance = %settings.appliance.address,
        forward = settings.forward.enabled,
        sink = %settings.forward.sink_address,
        "starting bridge"
    );

    let authenticator = Arc::new(
        HttpAuthenticator::new(AuthConfig::from_settings(&settings.appliance))
            .context("Failed to build HTTP client")?,
    );
    let images = Arc::new(JpegImageStore::new(settings.images.output_dir.clone()));
    tracing::debug!(dir = %images.dir().display(), "image store ready");
    let forward = forward_pool(&settings)?;
    let pipeline = Arc::new(EventPipeline::new(images, forward.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        OrchestratorConfig::from_settings(&settings),
        authenticator,
        pipeline,
    ));

    let coordinator = ShutdownCoordinator::new();
    let logger = spawn_state_logger(orchestrator.subscribe());
    let runner = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        let token = coordinator.token();
        async move { orchestrator.run(token).await }
    });

    wait_for_signal().await;
    tracing::info!("shutdown signal received");

    let clean = coordinator
        .graceful_shutdown(vec![runner, logger], Some(settings.session.shutdown_grace()))
        .await;

    if let Some(pool) = forward {
        let stats = pool.stats();
        tracing::info!(
            submitted = stats.submitted(),
            delivered = stats.delivered(),
            dropped = stats.dropped(),
            failed = stats.failed(),
            "forward totals"
        );
    }
    tracing::debug!(snapshot = %metrics.render(), "final metrics");
    tracing::info!(clean, attempts = orchestrator.attempts(), "bridge stopped");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
