//! Local filesystem blob storage for frame images.
//!
//! One JPEG file per frame, named `<frame id>.jpg`, under a single root
//! directory.

use std::path::PathBuf;

use crate::types::FrameId;

/// File extension for stored frame images.
pub const FRAME_FILE_EXTENSION: &str = "jpg";

/// Writes and reads frame images under a root directory.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root directory if it does not exist yet.
    pub async fn ensure_root(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    /// Path at which the image for `id` is (or will be) stored.
    pub fn path_for(&self, id: FrameId) -> PathBuf {
        self.root.join(format!("{id}.{FRAME_FILE_EXTENSION}"))
    }

    /// Persist the image bytes for a frame, returning the file path.
    pub async fn write(&self, id: FrameId, bytes: &[u8]) -> std::io::Result<PathBuf> {
        let path = self.path_for(id);
        tokio::fs::write(&path, bytes).await?;
        Ok(path)
    }

    /// Best-effort removal of a frame's image. Missing files are ignored.
    pub async fn remove(&self, id: FrameId) {
        let _ = tokio::fs::remove_file(self.path_for(id)).await;
    }
}
