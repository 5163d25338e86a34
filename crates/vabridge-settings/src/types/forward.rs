//! Downstream forwarding settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where and how alert events are relayed.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForwardSettings {
    /// Whether events are forwarded at all.
    pub enabled: bool,
    /// `host:port` of the aggregation sink.
    pub sink_address: String,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Write timeout in milliseconds.
    pub write_timeout_ms: u64,
    /// Maximum concurrent deliveries; extra events are dropped.
    pub max_in_flight: usize,
    /// Fixed frame header fields.
    pub header: HeaderSettings,
    /// Fixed message body values.
    pub body: BodySettings,
}

impl Default for ForwardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sink_address: "192.168.11.100:9201".to_string(),
            connect_timeout_ms: 3000,
            write_timeout_ms: 3000,
            max_in_flight: 16,
            header: HeaderSettings::default(),
            body: BodySettings::default(),
        }
    }
}

impl ForwardSettings {
    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Write timeout as a [`Duration`].
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

/// Frame header identifiers. Values are space-padded to their fixed width.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeaderSettings {
    /// Protocol tag (3 bytes).
    pub protocol_tag: String,
    /// Site code (8 bytes).
    pub site_code: String,
    /// Application code (2 bytes).
    pub app_code: String,
    /// Service code (9 bytes).
    pub service_code: String,
    /// Message exchange pattern flag (1 byte).
    pub exchange_pattern: String,
    /// Message type code (3 bytes).
    pub message_type: String,
}

impl Default for HeaderSettings {
    fn default() -> Self {
        Self {
            protocol_tag: "SMT".to_string(),
            site_code: "PA1".to_string(),
            app_code: "A1".to_string(),
            service_code: "SIM".to_string(),
            exchange_pattern: " ".to_string(),
            message_type: "001".to_string(),
        }
    }
}

impl HeaderSettings {
    /// `(key, value, width)` for every header field, in frame order.
    pub fn fields(&self) -> [(&'static str, &str, usize); 6] {
        [
            ("protocolTag", self.protocol_tag.as_str(), 3),
            ("siteCode", self.site_code.as_str(), 8),
            ("appCode", self.app_code.as_str(), 2),
            ("serviceCode", self.service_code.as_str(), 9),
            ("exchangePattern", self.exchange_pattern.as_str(), 1),
            ("messageType", self.message_type.as_str(), 3),
        ]
    }
}

/// Static values placed in every forwarded message body.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BodySettings {
    /// `statEvetGdCd`.
    pub grade_code: String,
    /// `outbPosNm`.
    pub position_name: String,
    /// `uSvcOutbId`.
    pub service_outbreak_id: String,
    /// `statEvetId`.
    pub event_id: String,
    /// `statEvetCntn`, in order.
    pub content_tags: Vec<String>,
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            grade_code: "99".to_string(),
            position_name: "scold".to_string(),
            service_outbreak_id: "intellivid-event".to_string(),
            event_id: "SMT-PA1-000TAG002E01".to_string(),
            content_tags: vec!["sleep".into(), "comma".into(), "flag".into()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_defaults() {
        let h = HeaderSettings::default();
        assert_eq!(h.protocol_tag, "SMT");
        assert_eq!(h.site_code, "PA1");
        assert_eq!(h.exchange_pattern, " ");
        assert_eq!(h.message_type, "001");
    }

    #[test]
    fn header_fields_in_frame_order() {
        let h = HeaderSettings::default();
        let widths: Vec<usize> = h.fields().iter().map(|(_, _, w)| *w).collect();
        assert_eq!(widths, vec![3, 8, 2, 9, 1, 3]);
        assert_eq!(h.fields()[1].1, "PA1");
    }

    #[test]
    fn body_tags_keep_order() {
        let b: BodySettings =
            serde_json::from_str(r#"{"contentTags": ["b", "a", "c"]}"#).unwrap();
        assert_eq!(b.content_tags, vec!["b", "a", "c"]);
        assert_eq!(b.grade_code, "99");
    }

    #[test]
    fn timeouts() {
        let f = ForwardSettings::default();
        assert_eq!(f.connect_timeout(), Duration::from_secs(3));
        assert_eq!(f.write_timeout(), Duration::from_secs(3));
    }
}
