//! # vabridge-settings
//!
//! Configuration for the vabridge agent, loaded once at startup from three
//! layers (in priority order):
//! 1. **Compiled defaults**: [`BridgeSettings::default()`]
//! 2. **Settings file**: `~/.vabridge/settings.json` or `--config` (deep-merged over defaults)
//! 3. **Environment variables**: `VABRIDGE_*` overrides (highest priority)
//!
//! The loaded value is passed explicitly to the orchestrator; there is no
//! global settings instance and no hot reload.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, apply_overrides, default_settings_path, load_settings,
    load_settings_from_path, overlay,
};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
