//! Image persistence errors.

/// Failure to decode or store an image. Logged and dropped.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The payload was not a decodable image.
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),

    /// Creating the directory or writing the file failed.
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled.
    #[error("image worker failed: {0}")]
    Worker(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
