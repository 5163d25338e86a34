//! Inbound decode error types.

/// Errors raised while decoding an inbound metadata frame.
///
/// Always recovered locally: the frame is logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The frame was not valid JSON, or a field had the wrong JSON type.
    #[error("malformed metadata JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field was absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field was present but unusable.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
