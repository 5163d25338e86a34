//! Auth error types.

/// Errors that can occur during login or keepalive.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The appliance answered with a non-success status.
    #[error("rejected by appliance (status {status})")]
    Rejected {
        /// HTTP status code.
        status: u16,
    },

    /// The login response body was not JSON.
    #[error("malformed login response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The login response had no usable `api-key` field.
    #[error("login response has no api-key")]
    MissingCredential,
}

impl AuthError {
    /// Whether the failure happened before any response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
