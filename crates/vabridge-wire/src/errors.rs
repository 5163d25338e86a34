//! Framing and forwarding error types.

use std::time::Duration;

/// Errors produced while building or parsing a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A header value does not fit its fixed-width field.
    #[error("header field {field} is wider than {width} bytes: {value:?}")]
    FieldTooWide {
        /// Field name.
        field: &'static str,
        /// Fixed width in bytes.
        width: usize,
        /// Offending value.
        value: String,
    },

    /// The body length does not fit the 4-byte length field.
    #[error("body of {0} bytes exceeds the u32 length field")]
    BodyTooLarge(usize),

    /// Not enough bytes for a complete frame.
    #[error("incomplete frame: need {needed} more bytes")]
    Incomplete {
        /// Additional bytes required.
        needed: usize,
    },

    /// A header segment was not valid ASCII/UTF-8.
    #[error("invalid header segment: {0}")]
    InvalidHeader(&'static str),
}

/// Errors delivering a message to the sink.
///
/// Always recovered locally: logged, counted and dropped.
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// Body serialization failed.
    #[error("failed to encode forward message: {0}")]
    Encode(#[from] serde_json::Error),

    /// Frame construction failed.
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// TCP connect failed.
    #[error("sink connect failed: {0}")]
    Connect(#[source] std::io::Error),

    /// Writing the frame failed.
    #[error("sink write failed: {0}")]
    Write(#[source] std::io::Error),

    /// A stage exceeded its deadline.
    #[error("sink {stage} timed out after {timeout:?}")]
    Timeout {
        /// `connect` or `write`.
        stage: &'static str,
        /// Configured limit.
        timeout: Duration,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_too_wide_display() {
        let err = FrameError::FieldTooWide {
            field: "appCode",
            width: 2,
            value: "ABC".into(),
        };
        assert_eq!(
            err.to_string(),
            "header field appCode is wider than 2 bytes: \"ABC\""
        );
    }

    #[test]
    fn incomplete_display() {
        let err = FrameError::Incomplete { needed: 5 };
        assert_eq!(err.to_string(), "incomplete frame: need 5 more bytes");
    }

    #[test]
    fn timeout_display() {
        let err = ForwardError::Timeout {
            stage: "connect",
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "sink connect timed out after 3s");
    }

    #[test]
    fn frame_error_is_transparent() {
        let err = ForwardError::from(FrameError::BodyTooLarge(1));
        assert_eq!(err.to_string(), "body of 1 bytes exceeds the u32 length field");
    }
}
