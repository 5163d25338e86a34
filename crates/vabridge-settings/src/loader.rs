//! Building a [`BridgeSettings`] from its three sources.
//!
//! The compiled defaults are serialized to JSON, the operator's file is laid
//! over them key by key, and the result is deserialized back. Only then are
//! `VABRIDGE_*` variables applied, on the typed value, so an environment
//! override can never be shadowed by the file. An operator file may name a
//! single nested key (`{"forward": {"enabled": false}}`) without restating
//! the rest of its section.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};
use vabridge_core::LogLevel;

use crate::errors::Result;
use crate::types::BridgeSettings;

/// `$HOME/.vabridge/settings.json`, used when `--config` is not given.
pub fn default_settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".vabridge").join("settings.json")
}

/// [`load_settings_from_path`] on [`default_settings_path`].
pub fn load_settings() -> Result<BridgeSettings> {
    load_settings_from_path(&default_settings_path())
}

/// Defaults, overlaid with the file at `path` (if any), then env overrides.
///
/// A missing file is not an error. An unreadable or malformed one is, and so
/// is a value of the wrong type (`"maxInFlight": "four"`).
pub fn load_settings_from_path(path: &Path) -> Result<BridgeSettings> {
    let mut merged = serde_json::to_value(BridgeSettings::default())?;
    match read_layer(path)? {
        Some(layer) => {
            info!(path = %path.display(), "settings file loaded");
            overlay(&mut merged, layer);
        }
        None => debug!(path = %path.display(), "no settings file, using defaults"),
    }

    let mut settings: BridgeSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn read_layer(path: &Path) -> Result<Option<Value>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Lay `layer` over `base` in place.
///
/// Objects recurse per key. Any other `layer` value replaces the `base` value
/// wholesale, so `contentTags` lists are replaced rather than appended to.
/// `null` in `layer` leaves `base` untouched.
pub fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(slot) => overlay(slot, value),
                    None if value.is_null() => {}
                    None => {
                        let _ = base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Apply `VABRIDGE_*` environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut BridgeSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`.
///
/// Split out from [`apply_env_overrides`] so tests do not touch the process
/// environment.
pub fn apply_overrides<F>(settings: &mut BridgeSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let env = EnvReader { lookup };

    // ── Appliance ───────────────────────────────────────────────────
    if let Some(v) = env.string("VABRIDGE_APPLIANCE_ADDRESS") {
        settings.appliance.address = v;
    }
    if let Some(v) = env.string("VABRIDGE_IDENTITY") {
        settings.appliance.identity = v;
    }
    if let Some(v) = env.string("VABRIDGE_SECRET") {
        settings.appliance.secret = v;
    }
    if let Some(v) = env.bool("VABRIDGE_USE_TLS") {
        settings.appliance.use_tls = v;
    }

    // ── Session ─────────────────────────────────────────────────────
    if let Some(v) = env.u64("VABRIDGE_KEEPALIVE_SECS", 60, 86_400) {
        settings.session.keepalive_interval_secs = v;
    }
    if let Some(v) = env.u64("VABRIDGE_AUTH_BACKOFF_SECS", 1, 3600) {
        settings.session.auth_backoff_secs = v;
    }

    // ── Images / forward ────────────────────────────────────────────
    if let Some(v) = env.string("VABRIDGE_IMAGE_DIR") {
        settings.images.output_dir = v;
    }
    if let Some(v) = env.string("VABRIDGE_SINK_ADDRESS") {
        settings.forward.sink_address = v;
    }
    if let Some(v) = env.bool("VABRIDGE_FORWARD_ENABLED") {
        settings.forward.enabled = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = env.string("VABRIDGE_LOG_LEVEL") {
        settings.logging.level = LogLevel::from_str_lossy(&v);
    }
}

// ── Value parsing ───────────────────────────────────────────────────────────

/// `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`, any case.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// A `u64` inside `min..=max`.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Typed reads over a lookup; rejected values are logged and skipped.
struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "not a boolean, override ignored");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, min, max, "out of range, override ignored");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;
    use crate::errors::SettingsError;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    // ── overlay ─────────────────────────────────────────────────────

    fn overlaid(mut base: Value, layer: Value) -> Value {
        overlay(&mut base, layer);
        base
    }

    #[test]
    fn overlay_replaces_scalar() {
        let merged = overlaid(serde_json::json!({"a": 1, "b": 2}), serde_json::json!({"a": 10}));
        assert_eq!(merged, serde_json::json!({"a": 10, "b": 2}));
    }

    #[test]
    fn overlay_keeps_sibling_keys_in_nested_sections() {
        let merged = overlaid(
            serde_json::json!({"appliance": {"address": "a:1", "identity": "x"}}),
            serde_json::json!({"appliance": {"address": "b:2"}}),
        );
        assert_eq!(merged["appliance"]["address"], "b:2");
        assert_eq!(merged["appliance"]["identity"], "x");
    }

    #[test]
    fn overlay_replaces_lists_wholesale() {
        let merged = overlaid(
            serde_json::json!({"contentTags": ["sleep", "comma", "flag"]}),
            serde_json::json!({"contentTags": ["fire"]}),
        );
        assert_eq!(merged["contentTags"], serde_json::json!(["fire"]));
    }

    #[test]
    fn overlay_ignores_null() {
        let merged = overlaid(
            serde_json::json!({"a": 1, "b": {"c": 2}}),
            serde_json::json!({"a": null, "b": null, "z": null}),
        );
        assert_eq!(merged, serde_json::json!({"a": 1, "b": {"c": 2}}));
    }

    #[test]
    fn overlay_adds_unknown_keys() {
        let merged = overlaid(serde_json::json!({"a": 1}), serde_json::json!({"b": 2}));
        assert_eq!(merged, serde_json::json!({"a": 1, "b": 2}));
    }

    #[test]
    fn overlay_scalar_over_object() {
        let merged = overlaid(
            serde_json::json!({"a": {"nested": true}}),
            serde_json::json!({"a": 42}),
        );
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(load_settings_from_path(dir.path()), Err(SettingsError::Io(_)));
    }

    #[test]
    fn load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_settings_from_path(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings.appliance.identity, "intellivi");
        assert_eq!(settings.session.keepalive_interval_secs, 840);
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"appliance": {"address": "10.0.0.5:7681"}, "forward": {"maxInFlight": 4}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.appliance.address, "10.0.0.5:7681");
        assert_eq!(settings.appliance.subprotocol, "va-metadata");
        assert_eq!(settings.forward.max_in_flight, 4);
        assert_eq!(settings.forward.sink_address, "192.168.11.100:9201");
    }

    #[test]
    fn load_nested_header_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"forward": {"header": {"siteCode": "PB7"}}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.forward.header.site_code, "PB7");
        assert_eq!(settings.forward.header.protocol_tag, "SMT");
    }

    #[test]
    fn load_array_replace_not_merge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"forward": {"body": {"contentTags": ["only"]}}}"#).unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.forward.body.content_tags, vec!["only"]);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json(_)));
    }

    #[test]
    fn load_wrong_type_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"session": {"keepaliveIntervalSecs": "soon"}}"#).unwrap();
        assert_matches!(load_settings_from_path(&path), Err(SettingsError::Json(_)));
    }

    // ── overrides ───────────────────────────────────────────────────

    #[test]
    fn overrides_apply_over_file_values() {
        let mut settings = BridgeSettings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("VABRIDGE_APPLIANCE_ADDRESS", "10.1.1.1:80"),
                ("VABRIDGE_IDENTITY", "ops"),
                ("VABRIDGE_SECRET", "s3cret"),
                ("VABRIDGE_USE_TLS", "yes"),
                ("VABRIDGE_KEEPALIVE_SECS", "600"),
                ("VABRIDGE_AUTH_BACKOFF_SECS", "5"),
                ("VABRIDGE_IMAGE_DIR", "/var/lib/vabridge"),
                ("VABRIDGE_SINK_ADDRESS", "10.2.2.2:9201"),
                ("VABRIDGE_FORWARD_ENABLED", "off"),
                ("VABRIDGE_LOG_LEVEL", "debug"),
            ]),
        );
        assert_eq!(settings.appliance.address, "10.1.1.1:80");
        assert_eq!(settings.appliance.identity, "ops");
        assert_eq!(settings.appliance.secret, "s3cret");
        assert!(settings.appliance.use_tls);
        assert_eq!(settings.session.keepalive_interval_secs, 600);
        assert_eq!(settings.session.auth_backoff_secs, 5);
        assert_eq!(settings.images.output_dir, "/var/lib/vabridge");
        assert_eq!(settings.forward.sink_address, "10.2.2.2:9201");
        assert!(!settings.forward.enabled);
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }

    #[test]
    fn invalid_overrides_are_ignored() {
        let mut settings = BridgeSettings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("VABRIDGE_KEEPALIVE_SECS", "5"),
                ("VABRIDGE_AUTH_BACKOFF_SECS", "forever"),
                ("VABRIDGE_USE_TLS", "maybe"),
                ("VABRIDGE_IDENTITY", ""),
            ]),
        );
        assert_eq!(settings.session.keepalive_interval_secs, 840);
        assert_eq!(settings.session.auth_backoff_secs, 30);
        assert!(!settings.appliance.use_tls);
        assert_eq!(settings.appliance.identity, "intellivi");
    }

    // ── parsers ─────────────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for v in ["true", "1", "YES", "On"] {
            assert_eq!(parse_bool(v), Some(true), "{v}");
        }
        for v in ["false", "0", "no", "OFF"] {
            assert_eq!(parse_bool(v), Some(false), "{v}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_u64_range_bounds() {
        assert_eq!(parse_u64_range("60", 60, 100), Some(60));
        assert_eq!(parse_u64_range("100", 60, 100), Some(100));
        assert_eq!(parse_u64_range("59", 60, 100), None);
        assert_eq!(parse_u64_range("101", 60, 100), None);
        assert_eq!(parse_u64_range("-1", 0, 100), None);
        assert_eq!(parse_u64_range("abc", 0, 100), None);
    }

    #[test]
    fn default_path_is_under_vabridge_dir() {
        let path = default_settings_path();
        assert!(path.ends_with(".vabridge/settings.json"));
    }
}
