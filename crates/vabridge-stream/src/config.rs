//! Subscription endpoint configuration.

use std::time::Duration;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use vabridge_core::Credential;
use vabridge_settings::ApplianceSettings;

/// Query parameter asking the appliance to attach full images to alarms.
const ALARM_META: &str = "evtAlmMeta=fullImg";

/// Everything needed to open one subscription.
#[derive(Clone)]
pub struct ConnectionConfig {
    /// Full `ws://` or `wss://` URL including query.
    pub url: String,
    /// Subprotocol to request, if any.
    pub subprotocol: Option<String>,
    /// Skip certificate validation for `wss://`.
    pub accept_invalid_certs: bool,
    /// Upper bound on the handshake.
    pub handshake_timeout: Duration,
    /// Fail the connection if no frame arrives within this window.
    pub read_timeout: Option<Duration>,
}

impl ConnectionConfig {
    /// Plain config for `url` with default timeouts and no subprotocol.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subprotocol: None,
            accept_invalid_certs: false,
            handshake_timeout: Duration::from_secs(10),
            read_timeout: None,
        }
    }

    /// Alarm subscription for `credential`:
    /// `{ws_base}{subscriptionPath}?api-key={credential}&evtAlmMeta=fullImg`.
    pub fn subscription(settings: &ApplianceSettings, credential: &Credential) -> Self {
        let url = format!(
            "{}{}?api-key={}&{ALARM_META}",
            settings.ws_base(),
            settings.subscription_path,
            utf8_percent_encode(credential.expose(), NON_ALPHANUMERIC),
        );
        Self {
            url,
            subprotocol: Some(settings.subprotocol.clone()).filter(|p| !p.is_empty()),
            accept_invalid_certs: settings.accept_invalid_certs,
            handshake_timeout: settings.request_timeout(),
            read_timeout: settings.read_timeout(),
        }
    }

    /// Whether the URL asks for TLS.
    pub fn is_tls(&self) -> bool {
        self.url.starts_with("wss://")
    }

    /// URL with the query string removed, safe to log.
    pub fn redacted_url(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("url", &self.redacted_url())
            .field("subprotocol", &self.subprotocol)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("handshake_timeout", &self.handshake_timeout)
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_url_carries_credential() {
        let settings = ApplianceSettings::default();
        let config = ConnectionConfig::subscription(&settings, &Credential::new("abc123"));
        assert_eq!(
            config.url,
            "ws://192.168.2.50:7681/vaMetadata?api-key=abc123&evtAlmMeta=fullImg"
        );
        assert_eq!(config.subprotocol.as_deref(), Some("va-metadata"));
        assert!(!config.is_tls());
        assert!(config.read_timeout.is_none());
    }

    #[test]
    fn subscription_over_tls() {
        let settings = ApplianceSettings {
            use_tls: true,
            accept_invalid_certs: true,
            ..ApplianceSettings::default()
        };
        let config = ConnectionConfig::subscription(&settings, &Credential::new("k"));
        assert!(config.is_tls());
        assert!(config.accept_invalid_certs);
    }

    #[test]
    fn credential_is_query_encoded() {
        let settings = ApplianceSettings::default();
        let config = ConnectionConfig::subscription(&settings, &Credential::new("a b&c=d"));
        assert!(config.url.contains("api-key=a%20b%26c%3Dd&"));
    }

    #[test]
    fn credential_punctuation_never_splits_query() {
        let settings = ApplianceSettings::default();
        let config = ConnectionConfig::subscription(&settings, &Credential::new("k?x#y/z+"));
        assert!(config.url.ends_with("api-key=k%3Fx%23y%2Fz%2B&evtAlmMeta=fullImg"));
        assert_eq!(config.url.matches('?').count(), 1);
    }

    #[test]
    fn empty_subprotocol_is_none() {
        let settings = ApplianceSettings {
            subprotocol: String::new(),
            ..ApplianceSettings::default()
        };
        let config = ConnectionConfig::subscription(&settings, &Credential::new("k"));
        assert!(config.subprotocol.is_none());
    }

    #[test]
    fn debug_hides_query() {
        let settings = ApplianceSettings::default();
        let config = ConnectionConfig::subscription(&settings, &Credential::new("secret-key"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("/vaMetadata"));
    }
}
