//! Video-analytics appliance settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how to reach the appliance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplianceSettings {
    /// `host:port` of the appliance (HTTP and WebSocket share it).
    pub address: String,
    /// Login identity.
    pub identity: String,
    /// Login secret.
    pub secret: String,
    /// Use `https`/`wss` instead of `http`/`ws`.
    pub use_tls: bool,
    /// Skip certificate validation (self-signed appliances).
    pub accept_invalid_certs: bool,
    /// WebSocket subprotocol to negotiate.
    pub subprotocol: String,
    /// Timeout for login and keepalive requests in milliseconds.
    pub request_timeout_ms: u64,
    /// Read timeout on the subscription stream in milliseconds (0 disables).
    pub read_timeout_ms: u64,
    /// Login endpoint path.
    pub login_path: String,
    /// Keepalive endpoint path.
    pub keepalive_path: String,
    /// Subscription endpoint path.
    pub subscription_path: String,
}

impl Default for ApplianceSettings {
    fn default() -> Self {
        Self {
            address: "192.168.2.50:7681".to_string(),
            identity: "intellivi".to_string(),
            secret: "pass0001".to_string(),
            use_tls: false,
            accept_invalid_certs: false,
            subprotocol: "va-metadata".to_string(),
            request_timeout_ms: 10_000,
            read_timeout_ms: 0,
            login_path: "/users/login".to_string(),
            keepalive_path: "/keepalive".to_string(),
            subscription_path: "/vaMetadata".to_string(),
        }
    }
}

impl ApplianceSettings {
    /// `http://host:port` or `https://host:port`.
    pub fn http_base(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{scheme}://{}", self.address)
    }

    /// `ws://host:port` or `wss://host:port`.
    pub fn ws_base(&self) -> String {
        let scheme = if self.use_tls { "wss" } else { "ws" };
        format!("{scheme}://{}", self.address)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Read timeout, `None` when disabled.
    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_bases() {
        let s = ApplianceSettings::default();
        assert_eq!(s.http_base(), "http://192.168.2.50:7681");
        assert_eq!(s.ws_base(), "ws://192.168.2.50:7681");
    }

    #[test]
    fn tls_bases() {
        let s = ApplianceSettings {
            use_tls: true,
            ..ApplianceSettings::default()
        };
        assert_eq!(s.http_base(), "https://192.168.2.50:7681");
        assert_eq!(s.ws_base(), "wss://192.168.2.50:7681");
    }

    #[test]
    fn read_timeout_disabled_by_default() {
        let s = ApplianceSettings::default();
        assert!(s.read_timeout().is_none());
        let s = ApplianceSettings {
            read_timeout_ms: 1500,
            ..ApplianceSettings::default()
        };
        assert_eq!(s.read_timeout(), Some(Duration::from_millis(1500)));
    }
}
