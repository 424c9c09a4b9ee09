use std::sync::Arc;

use roadscan_core::types::{FrameId, Timestamp};
use serde::Serialize;
use tokio::sync::RwLock;

/// Metadata and still-encoded image of the most recently accepted frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestFrameSnapshot {
    pub id: FrameId,
    pub timestamp: Timestamp,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: Option<f64>,
    /// Base64 JPEG exactly as the client sent it.
    pub frame_b64: String,
    pub file_path: String,
    /// Frames accepted since process start, including this one.
    /// Assigned by [`LatestFrameCache::publish`].
    pub count: u64,
}

/// Single-slot cache of the most recent frame.
///
/// Written by ingest tasks, read by any number of polling viewers. Both
/// sides swap whole snapshots behind an `Arc`, so a reader always sees one
/// complete frame, never fields from two.
pub struct LatestFrameCache {
    slot: RwLock<Option<Arc<LatestFrameSnapshot>>>,
}

impl LatestFrameCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// Replace the cached snapshot unconditionally.
    ///
    /// The snapshot's `count` is overwritten with the running total under
    /// the same lock as the swap. Returns that count.
    pub async fn publish(&self, mut snapshot: LatestFrameSnapshot) -> u64 {
        let mut slot = self.slot.write().await;
        snapshot.count = slot.as_ref().map_or(0, |prev| prev.count) + 1;
        let count = snapshot.count;
        *slot = Some(Arc::new(snapshot));
        count
    }

    /// The current snapshot, or `None` when no frame has arrived yet.
    pub async fn latest(&self) -> Option<Arc<LatestFrameSnapshot>> {
        self.slot.read().await.clone()
    }
}

impl Default for LatestFrameCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The "no data yet" body served before any frame has arrived: the
/// snapshot shape with every field `null`.
pub fn empty_snapshot_json() -> serde_json::Value {
    serde_json::json!({
        "id": null,
        "timestamp": null,
        "lat": null,
        "lon": null,
        "accuracy": null,
        "frame_b64": null,
        "file_path": null,
        "count": null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(lat: f64) -> LatestFrameSnapshot {
        LatestFrameSnapshot {
            id: uuid::Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            lat: Some(lat),
            lon: Some(lat * 2.0),
            accuracy: None,
            frame_b64: format!("img-{lat}"),
            file_path: format!("/frames/{lat}.jpg"),
            count: 0,
        }
    }

    #[tokio::test]
    async fn empty_cache_has_no_snapshot() {
        let cache = LatestFrameCache::new();
        assert!(cache.latest().await.is_none());
    }

    #[tokio::test]
    async fn publish_replaces_whole_snapshot() {
        let cache = LatestFrameCache::new();
        let first = snapshot(1.0);
        let second = snapshot(2.0);

        assert_eq!(cache.publish(first).await, 1);
        assert_eq!(cache.publish(second.clone()).await, 2);

        let latest = cache.latest().await.unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.lat, Some(2.0));
        assert_eq!(latest.frame_b64, "img-2");
        assert_eq!(latest.count, 2);
    }

    #[tokio::test]
    async fn readers_keep_their_snapshot_after_overwrite() {
        let cache = LatestFrameCache::new();
        cache.publish(snapshot(1.0)).await;
        let held = cache.latest().await.unwrap();

        cache.publish(snapshot(2.0)).await;

        assert_eq!(held.lat, Some(1.0));
        assert_eq!(held.frame_b64, "img-1");
    }

    #[tokio::test]
    async fn concurrent_readers_never_see_torn_snapshots() {
        let cache = Arc::new(LatestFrameCache::new());

        let writer = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                for i in 0..200 {
                    cache.publish(snapshot(f64::from(i))).await;
                }
            })
        };

        let mut readers = Vec::new();
        for _ in 0..4 {
            let cache = Arc::clone(&cache);
            readers.push(tokio::spawn(async move {
                for _ in 0..200 {
                    if let Some(s) = cache.latest().await {
                        let lat = s.lat.unwrap();
                        assert_eq!(s.lon, Some(lat * 2.0));
                        assert_eq!(s.frame_b64, format!("img-{lat}"));
                    }
                    tokio::task::yield_now().await;
                }
            }));
        }

        writer.await.unwrap();
        for r in readers {
            r.await.unwrap();
        }
        assert_eq!(cache.latest().await.unwrap().count, 200);
    }

    #[test]
    fn empty_json_has_snapshot_keys() {
        let full = serde_json::to_value(snapshot(1.0)).unwrap();
        let empty = empty_snapshot_json();

        let mut full_keys: Vec<_> = full.as_object().unwrap().keys().cloned().collect();
        let mut empty_keys: Vec<_> = empty.as_object().unwrap().keys().cloned().collect();
        full_keys.sort();
        empty_keys.sort();

        assert_eq!(full_keys, empty_keys);
        assert!(empty.as_object().unwrap().values().all(|v| v.is_null()));
    }
}
