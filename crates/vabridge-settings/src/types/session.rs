//! Session supervision, image and logging settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vabridge_core::{LogFormat, LogLevel};

/// Timings for the session orchestrator and keepalive supervisor.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// Keepalive probe interval; must stay below the credential's expiry.
    pub keepalive_interval_secs: u64,
    /// Wait between failed authentication attempts.
    pub auth_backoff_secs: u64,
    /// Wait before re-authenticating after the stream failed or dropped.
    pub reconnect_delay_secs: u64,
    /// How long shutdown waits for in-flight work.
    pub shutdown_grace_ms: u64,
    /// Capacity of the inbound event channel.
    pub event_buffer: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: 14 * 60,
            auth_backoff_secs: 30,
            reconnect_delay_secs: 5,
            shutdown_grace_ms: 2000,
            event_buffer: 64,
        }
    }
}

impl SessionSettings {
    /// Keepalive interval as a [`Duration`].
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    /// Authentication backoff as a [`Duration`].
    pub fn auth_backoff(&self) -> Duration {
        Duration::from_secs(self.auth_backoff_secs)
    }

    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    /// Shutdown grace period as a [`Duration`].
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

/// Where decoded images are written.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSettings {
    /// Output directory.
    pub output_dir: String,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            output_dir: "./".to_string(),
        }
    }
}

/// Logging output.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level (`RUST_LOG` overrides).
    pub level: LogLevel,
    /// `compact` or `json`.
    pub format: LogFormat,
}
