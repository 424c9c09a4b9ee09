use std::sync::Arc;

use roadscan_core::blob::BlobStore;
use roadscan_core::frame::{decode_frame_message, MalformedMessage};
use roadscan_core::types::FrameId;
use roadscan_db::models::frame::CreateFrame;
use roadscan_db::FrameStore;

use crate::engine::{EnrichmentDispatcher, EnrichmentJob};
use crate::ingest::latest::{LatestFrameCache, LatestFrameSnapshot};

/// Why a single frame message was not ingested.
///
/// Every variant is recoverable: the connection moves on to the next
/// message.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Malformed(#[from] MalformedMessage),

    #[error("failed to write image for frame {frame_id}: {source}")]
    BlobWrite {
        frame_id: FrameId,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to insert frame {frame_id}: {source}")]
    Insert {
        frame_id: FrameId,
        #[source]
        source: sqlx::Error,
    },
}

impl IngestError {
    /// The frame id, once one had been allocated.
    pub fn frame_id(&self) -> Option<FrameId> {
        match self {
            IngestError::Malformed(_) => None,
            IngestError::BlobWrite { frame_id, .. } | IngestError::Insert { frame_id, .. } => {
                Some(*frame_id)
            }
        }
    }

    /// Pipeline stage the failure happened in, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            IngestError::Malformed(_) => "decode",
            IngestError::BlobWrite { .. } => "write_blob",
            IngestError::Insert { .. } => "insert_row",
        }
    }
}

/// Per-message ingest pipeline, shared by every stream connection.
pub struct FrameIngestor {
    blobs: BlobStore,
    store: Arc<dyn FrameStore>,
    latest: Arc<LatestFrameCache>,
    enrichment: EnrichmentDispatcher,
}

impl FrameIngestor {
    pub fn new(
        blobs: BlobStore,
        store: Arc<dyn FrameStore>,
        latest: Arc<LatestFrameCache>,
        enrichment: EnrichmentDispatcher,
    ) -> Self {
        Self {
            blobs,
            store,
            latest,
            enrichment,
        }
    }

    /// Ingest one text message.
    ///
    /// On success the frame's image is on disk, its row exists with the
    /// default verdict, the latest-frame cache shows it, and enrichment
    /// has been scheduled (not awaited). On failure nothing observable
    /// changes: a blob written before a failed insert is removed again.
    pub async fn ingest(&self, text: &str) -> Result<FrameId, IngestError> {
        let decoded = decode_frame_message(text)?;
        let frame_id = uuid::Uuid::new_v4();

        let path = self
            .blobs
            .write(frame_id, &decoded.image)
            .await
            .map_err(|source| IngestError::BlobWrite { frame_id, source })?;
        let file_path = path.to_string_lossy().into_owned();

        let create = CreateFrame {
            id: frame_id,
            captured_at: decoded.captured_at,
            lat: decoded.lat,
            lon: decoded.lon,
            file_path: file_path.clone(),
        };
        if let Err(source) = self.store.insert(&create).await {
            self.blobs.remove(frame_id).await;
            return Err(IngestError::Insert { frame_id, source });
        }

        self.latest
            .publish(LatestFrameSnapshot {
                id: frame_id,
                timestamp: decoded.captured_at,
                lat: decoded.lat,
                lon: decoded.lon,
                accuracy: decoded.accuracy,
                frame_b64: decoded.image_b64,
                file_path,
                count: 0,
            })
            .await;

        self.enrichment.dispatch(EnrichmentJob {
            frame_id,
            image_path: path,
        });

        Ok(frame_id)
    }
}
