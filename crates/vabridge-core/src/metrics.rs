//! Metric names emitted through the `metrics` facade.
//!
//! Library crates only record; the binary installs the recorder. Without a
//! recorder every `counter!` is a no-op.

/// Forwarded alarms (counter, labels: outcome = submitted | dropped | failed | delivered).
pub const FORWARD_EVENTS_TOTAL: &str = "vabridge_forward_events_total";
/// Subscription attempts started (counter).
pub const SESSION_ATTEMPTS_TOTAL: &str = "vabridge_session_attempts_total";
/// Attempts torn down for a reason other than shutdown (counter, labels: cause).
pub const SESSION_RESTARTS_TOTAL: &str = "vabridge_session_restarts_total";
/// Failed logins (counter).
pub const AUTH_FAILURES_TOTAL: &str = "vabridge_auth_failures_total";
/// Failed keepalive probes (counter, labels: kind = transport | rejected).
pub const KEEPALIVE_FAILURES_TOTAL: &str = "vabridge_keepalive_failures_total";
/// Alarm images handled (counter, labels: outcome = saved | failed | orphaned).
pub const IMAGES_TOTAL: &str = "vabridge_images_total";
