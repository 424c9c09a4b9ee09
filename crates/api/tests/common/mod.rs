#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use roadscan_core::blob::BlobStore;
use roadscan_core::types::FrameId;
use roadscan_core::verdict::Verdict;
use roadscan_db::models::frame::{CreateFrame, Frame};
use roadscan_db::FrameStore;
use roadscan_detector::{Detection, Detector, DetectorError};
use tower::ServiceExt;

use roadscan_api::auth::jwt::{Claims, JwtConfig};
use roadscan_api::config::{DetectorConfig, ServerConfig};
use roadscan_api::engine::EnrichmentDispatcher;
use roadscan_api::ingest::{FrameIngestor, LatestFrameCache};
use roadscan_api::router::build_app_router;
use roadscan_api::state::AppState;

/// "hello jpeg" in standard base64.
pub const IMAGE_B64: &str = "aGVsbG8ganBlZw==";

pub const TEST_SECRET: &str = "integration-test-secret-long-enough";

// ---------------------------------------------------------------------------
// Config + tokens
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` rooted at `storage_dir`.
pub fn test_config(storage_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
        storage_dir: storage_dir.to_path_buf(),
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        detector: DetectorConfig {
            url: "http://127.0.0.1:9/unused".to_string(),
            timeout_secs: 1,
            max_in_flight: 8,
        },
    }
}

/// Sign a token for the test driver expiring `exp_in` seconds from now.
pub fn token_expiring_in(config: &ServerConfig, exp_in: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "driver@example.com".to_string(),
        exp: now + exp_in,
        iat: Some(now),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
    )
    .unwrap()
}

pub fn valid_token(config: &ServerConfig) -> String {
    token_expiring_in(config, 3600)
}

pub fn expired_token(config: &ServerConfig) -> String {
    token_expiring_in(config, -3600)
}

/// A frame message with the given coordinates and the test image.
pub fn frame_message(lat: f64, lon: f64) -> String {
    serde_json::json!({
        "image": IMAGE_B64,
        "lat": lat,
        "lon": lon,
        "accuracy": 5.0,
        "timestamp": "2025-03-01T10:00:00Z",
    })
    .to_string()
}

// ---------------------------------------------------------------------------
// In-memory frame store
// ---------------------------------------------------------------------------

/// `FrameStore` keeping rows in a map. Inserts can be made to fail.
#[derive(Default)]
pub struct MemoryFrameStore {
    frames: Mutex<HashMap<FrameId, Frame>>,
    fail_inserts: AtomicBool,
    verdict_writes: AtomicUsize,
}

impl MemoryFrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, id: FrameId) -> Option<Frame> {
        self.frames.lock().unwrap().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap().len()
    }

    pub fn verdict_writes(&self) -> usize {
        self.verdict_writes.load(Ordering::SeqCst)
    }

    /// Insert a row directly, bypassing the ingest path.
    pub fn seed(&self, create: CreateFrame) {
        let frame = new_row(&create);
        self.frames.lock().unwrap().insert(frame.id, frame);
    }
}

fn new_row(create: &CreateFrame) -> Frame {
    Frame {
        id: create.id,
        captured_at: create.captured_at,
        lat: create.lat,
        lon: create.lon,
        file_path: create.file_path.clone(),
        is_pothole: false,
        pothole_area_percent: 0.0,
        created_at: chrono::Utc::now(),
    }
}

#[async_trait]
impl FrameStore for MemoryFrameStore {
    async fn insert(&self, create: &CreateFrame) -> Result<Frame, sqlx::Error> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolClosed);
        }
        let frame = new_row(create);
        self.frames.lock().unwrap().insert(frame.id, frame.clone());
        Ok(frame)
    }

    async fn update_verdict(&self, id: FrameId, verdict: Verdict) -> Result<bool, sqlx::Error> {
        self.verdict_writes.fetch_add(1, Ordering::SeqCst);
        let mut frames = self.frames.lock().unwrap();
        match frames.get_mut(&id) {
            Some(frame) => {
                frame.is_pothole = verdict.detected;
                frame.pothole_area_percent = verdict.area_percent;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_with_coordinates(&self) -> Result<Vec<Frame>, sqlx::Error> {
        let mut frames: Vec<Frame> = self
            .frames
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.lat.is_some() && f.lon.is_some())
            .cloned()
            .collect();
        frames.sort_by_key(|f| f.captured_at);
        Ok(frames)
    }

    async fn health_check(&self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scripted detector
// ---------------------------------------------------------------------------

/// What the scripted detector answers for a frame.
#[derive(Clone)]
pub enum Scripted {
    /// Respond with one detection of the given area.
    Area(f64),
    /// Respond with an empty list.
    Nothing,
    /// Fail as if the service were down.
    Unavailable,
}

/// `Detector` whose answers are set per frame id, with a default.
pub struct ScriptedDetector {
    default: Scripted,
    per_frame: Mutex<HashMap<FrameId, Scripted>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn new(default: Scripted) -> Self {
        Self {
            default,
            per_frame: Mutex::new(HashMap::new()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn script(&self, frame_id: FrameId, answer: Scripted) {
        self.per_frame.lock().unwrap().insert(frame_id, answer);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    async fn detect(
        &self,
        frame_id: FrameId,
        _file_name: &str,
        _image: Vec<u8>,
    ) -> Result<Vec<Detection>, DetectorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let answer = self
            .per_frame
            .lock()
            .unwrap()
            .get(&frame_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        match answer {
            Scripted::Area(area) => Ok(vec![Detection {
                porthole_area_percentage: Some(area),
            }]),
            Scripted::Nothing => Ok(Vec::new()),
            Scripted::Unavailable => Err(DetectorError::HttpStatus {
                status: 503,
                body: "detector unavailable".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// App wiring
// ---------------------------------------------------------------------------

/// Everything a test needs to drive and inspect the pipeline.
pub struct TestHarness {
    pub dir: tempfile::TempDir,
    pub config: ServerConfig,
    pub store: Arc<MemoryFrameStore>,
    pub detector: Arc<ScriptedDetector>,
    pub state: AppState,
}

impl TestHarness {
    pub async fn new(detector: ScriptedDetector) -> Self {
        Self::with_max_in_flight(detector, 8).await
    }

    pub async fn with_max_in_flight(detector: ScriptedDetector, max_in_flight: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let store = Arc::new(MemoryFrameStore::new());
        let detector = Arc::new(detector);

        let blobs = BlobStore::new(dir.path());
        blobs.ensure_root().await.unwrap();

        let enrichment = EnrichmentDispatcher::new(
            Arc::clone(&store) as Arc<dyn FrameStore>,
            Arc::clone(&detector) as Arc<dyn Detector>,
            max_in_flight,
        );
        let latest = Arc::new(LatestFrameCache::new());
        let ingestor = Arc::new(FrameIngestor::new(
            blobs,
            Arc::clone(&store) as Arc<dyn FrameStore>,
            Arc::clone(&latest),
            enrichment.clone(),
        ));

        let state = AppState {
            config: Arc::new(config.clone()),
            store: Arc::clone(&store) as Arc<dyn FrameStore>,
            latest,
            ingestor,
            enrichment,
        };

        Self {
            dir,
            config,
            store,
            detector,
            state,
        }
    }

    /// The full application router with all middleware layers.
    pub fn app(&self) -> Router {
        build_app_router(self.state.clone(), &self.config)
    }

    /// Serve the app on an ephemeral port.
    pub async fn spawn_server(&self) -> SocketAddr {
        let app = self.app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// Wait until every dispatched enrichment task has finished.
    pub async fn drain_enrichment(&self) {
        assert!(
            self.state.enrichment.shutdown(Duration::from_secs(5)).await,
            "enrichment did not finish in time"
        );
    }
}

// ---------------------------------------------------------------------------
// HTTP helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn get_with_token(app: Router, uri: &str, token: &str) -> Response<Body> {
    app.oneshot(
        Request::get(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
