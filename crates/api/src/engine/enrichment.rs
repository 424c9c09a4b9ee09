//! Background frame enrichment.
//!
//! Every ingested frame is handed to [`EnrichmentDispatcher::dispatch`],
//! which spawns an independent task: read the stored image, ask the
//! external detector for a verdict, and write that verdict back to the
//! frame row. Ingestion never waits on this and never hears about its
//! failures; the only observable outcome is the row update.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use roadscan_core::types::FrameId;
use roadscan_core::verdict::Verdict;
use roadscan_db::FrameStore;
use roadscan_detector::{verdict_from, Detector, DetectorError};
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

/// Fallback multipart file name when the stored path has none.
const DEFAULT_FILE_NAME: &str = "frame.jpg";

/// One unit of enrichment work.
#[derive(Debug, Clone)]
pub struct EnrichmentJob {
    pub frame_id: FrameId,
    /// Where the frame's JPEG was written at ingest time.
    pub image_path: PathBuf,
}

/// Why enrichment of one frame ended without a verdict update.
#[derive(Debug, thiserror::Error)]
pub enum EnrichmentError {
    #[error("failed to read stored image: {0}")]
    ReadImage(#[source] std::io::Error),

    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error("verdict update failed: {0}")]
    Store(#[from] sqlx::Error),
}

impl EnrichmentError {
    /// Pipeline stage the failure happened in, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            EnrichmentError::ReadImage(_) => "read_image",
            EnrichmentError::Detector(_) => "detect",
            EnrichmentError::Store(_) => "update_verdict",
        }
    }
}

/// Spawns and tracks per-frame enrichment tasks.
///
/// Cheap to clone; clones share the detector, the concurrency limit and
/// the task tracker.
#[derive(Clone)]
pub struct EnrichmentDispatcher {
    store: Arc<dyn FrameStore>,
    detector: Arc<dyn Detector>,
    limiter: Option<Arc<Semaphore>>,
    tracker: TaskTracker,
}

impl EnrichmentDispatcher {
    /// Create a dispatcher allowing at most `max_in_flight` concurrent
    /// detector calls (`0` means no cap).
    pub fn new(
        store: Arc<dyn FrameStore>,
        detector: Arc<dyn Detector>,
        max_in_flight: usize,
    ) -> Self {
        let limiter = (max_in_flight > 0).then(|| Arc::new(Semaphore::new(max_in_flight)));
        Self {
            store,
            detector,
            limiter,
            tracker: TaskTracker::new(),
        }
    }

    /// Schedule enrichment for a frame and return immediately.
    ///
    /// The task is not tied to the caller: it keeps running after the
    /// connection that ingested the frame has closed. When the concurrency
    /// cap is reached the task waits for a permit inside the spawned task,
    /// never in the caller.
    pub fn dispatch(&self, job: EnrichmentJob) {
        let this = self.clone();
        self.tracker.spawn(async move {
            let _permit = match &this.limiter {
                Some(limiter) => Arc::clone(limiter).acquire_owned().await.ok(),
                None => None,
            };
            this.run(job).await;
        });
    }

    /// Number of enrichment tasks spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Close the tracker and wait for in-flight tasks to finish.
    ///
    /// Returns `true` if every task finished within `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        tokio::time::timeout(timeout, self.tracker.wait())
            .await
            .is_ok()
    }

    /// One enrichment pass for a frame, returning the verdict written.
    ///
    /// Writing the same verdict twice leaves the row unchanged, so
    /// re-running a pass is safe.
    pub async fn enrich(&self, job: &EnrichmentJob) -> Result<Verdict, EnrichmentError> {
        let image = tokio::fs::read(&job.image_path)
            .await
            .map_err(EnrichmentError::ReadImage)?;

        let file_name = job
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let detections = self
            .detector
            .detect(job.frame_id, &file_name, image)
            .await?;
        tracing::debug!(
            frame_id = %job.frame_id,
            detections = detections.len(),
            "Detector responded",
        );

        let verdict = verdict_from(&detections);
        let updated = self.store.update_verdict(job.frame_id, verdict).await?;
        if !updated {
            tracing::warn!(frame_id = %job.frame_id, "Frame row not found, verdict dropped");
        }

        Ok(verdict)
    }

    /// Run one pass and log its outcome. Never fails outward.
    async fn run(&self, job: EnrichmentJob) {
        tracing::debug!(frame_id = %job.frame_id, "Enrichment started");

        match self.enrich(&job).await {
            Ok(verdict) if verdict.detected => {
                tracing::info!(
                    frame_id = %job.frame_id,
                    area_percent = verdict.area_percent,
                    "Pothole detected, verdict stored",
                );
            }
            Ok(_) => {
                tracing::info!(frame_id = %job.frame_id, "No pothole detected");
            }
            Err(e) => {
                tracing::warn!(
                    frame_id = %job.frame_id,
                    stage = e.stage(),
                    error = %e,
                    "Frame enrichment failed, verdict left at default",
                );
            }
        }
    }
}
