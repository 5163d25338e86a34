//! Still-image persistence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::debug;
use vabridge_core::ImageName;

use crate::errors::PersistError;

/// Decodes an image payload and stores it under a name.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `data` as `name`; returns where it was written.
    async fn persist(&self, name: &ImageName, data: Bytes) -> Result<PathBuf, PersistError>;
}

/// Writes `{dir}/{name}.jpeg`, re-encoding whatever format arrived.
#[derive(Clone, Debug)]
pub struct JpegImageStore {
    dir: PathBuf,
}

impl JpegImageStore {
    /// Store under `dir` (created on first write).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageStore for JpegImageStore {
    async fn persist(&self, name: &ImageName, data: Bytes) -> Result<PathBuf, PersistError> {
        let path = self.dir.join(name.file_name());
        let dir = self.dir.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> Result<(), PersistError> {
            let decoded = image::load_from_memory(&data)?;
            std::fs::create_dir_all(&dir)?;
            // JPEG has no alpha channel.
            DynamicImage::ImageRgb8(decoded.to_rgb8())
                .save_with_format(&target, ImageFormat::Jpeg)
                .map_err(|e| match e {
                    image::ImageError::IoError(io) => PersistError::Io(io),
                    other => PersistError::Decode(other),
                })
        })
        .await
        .map_err(|e| PersistError::Worker(e.to_string()))??;

        debug!(path = %path.display(), "image saved");
        Ok(path)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
