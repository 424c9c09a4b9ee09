use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight enrichment, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Directory holding one JPEG per ingested frame.
    pub storage_dir: PathBuf,
    /// JWT token configuration (shared secret, expiry).
    pub jwt: JwtConfig,
    /// External detection service settings.
    pub detector: DetectorConfig,
}

/// Settings for the external detection service and the enrichment pool.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Full URL of the prediction endpoint.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent enrichment calls; `0` disables the cap.
    pub max_in_flight: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                                  |
    /// |----------------------------|------------------------------------------|
    /// | `HOST`                     | `0.0.0.0`                                |
    /// | `PORT`                     | `8000`                                   |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`                  |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                                     |
    /// | `STORAGE_DIR`              | `storage/frames`                         |
    /// | `DETECTOR_URL`             | `http://localhost:8001/predict_severity` |
    /// | `DETECTOR_TIMEOUT_SECS`    | `30`                                     |
    /// | `ENRICHMENT_MAX_IN_FLIGHT` | `32`                                     |
    ///
    /// # Panics
    ///
    /// Panics if a numeric variable does not parse, or if the JWT
    /// settings are missing (see [`JwtConfig::from_env`]).
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 8000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        let storage_dir = std::env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage/frames"));

        let detector = DetectorConfig {
            url: std::env::var("DETECTOR_URL")
                .unwrap_or_else(|_| "http://localhost:8001/predict_severity".into()),
            timeout_secs: env_or("DETECTOR_TIMEOUT_SECS", 30),
            max_in_flight: env_or("ENRICHMENT_MAX_IN_FLIGHT", 32),
        };

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            storage_dir,
            jwt,
            detector,
        }
    }
}

/// Read and parse an env var, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid {}: {e}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}
