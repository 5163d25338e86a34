//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]` and `#[serde(default)]`,
//! so a settings file only needs the keys it overrides.

mod appliance;
mod forward;
mod session;

pub use appliance::*;
pub use forward::*;
pub use session::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// # JSON Format
///
/// ```json
/// {
///   "appliance": { "address": "10.0.0.5:7681", "identity": "ops" },
///   "session": { "keepaliveIntervalSecs": 600 },
///   "forward": { "sinkAddress": "10.0.0.9:9201" }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// Video-analytics appliance endpoints and identity.
    pub appliance: ApplianceSettings,
    /// Session supervision timings.
    pub session: SessionSettings,
    /// Image persistence.
    pub images: ImageSettings,
    /// Downstream forwarding.
    pub forward: ForwardSettings,
    /// Logging output.
    pub logging: LoggingSettings,
}

impl BridgeSettings {
    /// Reject values the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.appliance.address.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "appliance.address must not be empty".into(),
            ));
        }
        if self.appliance.identity.is_empty() {
            return Err(SettingsError::InvalidValue(
                "appliance.identity must not be empty".into(),
            ));
        }
        // Zero would mean "always time out" here; only readTimeoutMs uses 0 for "off".
        for (key, value) in [
            ("appliance.requestTimeoutMs", self.appliance.request_timeout_ms),
            ("forward.connectTimeoutMs", self.forward.connect_timeout_ms),
            ("forward.writeTimeoutMs", self.forward.write_timeout_ms),
        ] {
            if value == 0 {
                return Err(SettingsError::InvalidValue(format!("{key} must be > 0")));
            }
        }
        if self.session.keepalive_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "session.keepaliveIntervalSecs must be > 0".into(),
            ));
        }
        if self.session.event_buffer == 0 {
            return Err(SettingsError::InvalidValue(
                "session.eventBuffer must be > 0".into(),
            ));
        }
        if self.forward.enabled && self.forward.sink_address.trim().is_empty() {
            return Err(SettingsError::InvalidValue(
                "forward.sinkAddress must not be empty when forwarding is enabled".into(),
            ));
        }
        if self.forward.max_in_flight == 0 {
            return Err(SettingsError::InvalidValue(
                "forward.maxInFlight must be > 0".into(),
            ));
        }
        for (key, value, width) in self.forward.header.fields() {
            if value.len() > width {
                return Err(SettingsError::InvalidValue(format!(
                    "forward.header.{key} is wider than {width} bytes: {value:?}"
                )));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_serde_roundtrip() {
        let defaults = BridgeSettings::default();
        let json = serde_json::to_string(&defaults).unwrap();
        let back: BridgeSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.appliance.address, defaults.appliance.address);
        assert_eq!(
            back.session.keepalive_interval_secs,
            defaults.session.keepalive_interval_secs
        );
        assert_eq!(back.forward.body.content_tags, defaults.forward.body.content_tags);
    }

    #[test]
    fn json_field_names_are_camel_case() {
        let json = serde_json::to_value(BridgeSettings::default()).unwrap();
        assert!(json["appliance"].get("useTls").is_some());
        assert!(json["appliance"].get("acceptInvalidCerts").is_some());
        assert!(json["session"].get("keepaliveIntervalSecs").is_some());
        assert!(json["forward"].get("sinkAddress").is_some());
        assert!(json["forward"]["header"].get("protocolTag").is_some());
        assert!(json["images"].get("outputDir").is_some());
    }

    #[test]
    fn empty_json_produces_defaults() {
        let settings: BridgeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.appliance.identity, "intellivi");
        assert_eq!(settings.forward.max_in_flight, 16);
    }

    #[test]
    fn validate_rejects_zero_keepalive() {
        let mut s = BridgeSettings::default();
        s.session.keepalive_interval_secs = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeouts() {
        let mut s = BridgeSettings::default();
        s.appliance.request_timeout_ms = 0;
        assert!(s.validate().unwrap_err().to_string().contains("requestTimeoutMs"));

        let mut s = BridgeSettings::default();
        s.forward.connect_timeout_ms = 0;
        assert!(s.validate().unwrap_err().to_string().contains("connectTimeoutMs"));

        let mut s = BridgeSettings::default();
        s.forward.write_timeout_ms = 0;
        assert!(s.validate().unwrap_err().to_string().contains("writeTimeoutMs"));
    }

    #[test]
    fn validate_allows_disabled_read_timeout() {
        let mut s = BridgeSettings::default();
        s.appliance.read_timeout_ms = 0;
        s.validate().unwrap();
    }

    #[test]
    fn validate_rejects_empty_address() {
        let mut s = BridgeSettings::default();
        s.appliance.address = "  ".into();
        assert!(s.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_in_flight() {
        let mut s = BridgeSettings::default();
        s.forward.max_in_flight = 0;
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("maxInFlight"));
    }

    #[test]
    fn validate_rejects_wide_header_field() {
        let mut s = BridgeSettings::default();
        s.forward.header.app_code = "ABC".into();
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("appCode"));
    }

    #[test]
    fn validate_accepts_full_width_header_field() {
        let mut s = BridgeSettings::default();
        s.forward.header.site_code = "ABCDEFGH".into();
        s.validate().unwrap();
    }

    #[test]
    fn validate_allows_empty_sink_when_disabled() {
        let mut s = BridgeSettings::default();
        s.forward.enabled = false;
        s.forward.sink_address = String::new();
        s.validate().unwrap();
    }
}
