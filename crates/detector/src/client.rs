//! HTTP client for the external pothole detection service.
//!
//! Wraps the service's single prediction endpoint using [`reqwest`]: the
//! frame image goes up as multipart field `file`, and a JSON list of
//! detections comes back.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use roadscan_core::types::FrameId;

use crate::detection::Detection;

/// MIME type of uploaded frame images.
const IMAGE_MIME: &str = "image/jpeg";

/// Errors from a single detection call.
///
/// None of these are retried; the frame keeps its default verdict.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with something other than 200 OK.
    #[error("Detector returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The service answered 200 but not with a JSON body.
    #[error("Detector returned non-JSON response (content-type: {content_type}): {body}")]
    NotJson { content_type: String, body: String },

    /// The JSON body was not a list of detections.
    #[error("Malformed detector response: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

/// Something that can turn a frame image into a list of detections.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Run detection on one frame's image.
    ///
    /// `file_name` is the stored blob's name; it is forwarded to the
    /// service as the multipart file name.
    async fn detect(
        &self,
        frame_id: FrameId,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<Vec<Detection>, DetectorError>;
}

/// HTTP client for a detection service endpoint.
#[derive(Debug, Clone)]
pub struct DetectorClient {
    client: reqwest::Client,
    endpoint: String,
}

impl DetectorClient {
    /// Create a client for `endpoint` (the full prediction URL, e.g.
    /// `http://host:8001/predict_severity`) with a per-request timeout.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, DetectorError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    // ---- private helpers ----

    /// Require 200 OK and a JSON content type, then decode the body as a
    /// list of detections.
    async fn parse_response(response: reqwest::Response) -> Result<Vec<Detection>, DetectorError> {
        let status = response.status();
        if status != StatusCode::OK {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DetectorError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("application/json") {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DetectorError::NotJson { content_type, body });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl Detector for DetectorClient {
    async fn detect(
        &self,
        frame_id: FrameId,
        file_name: &str,
        image: Vec<u8>,
    ) -> Result<Vec<Detection>, DetectorError> {
        let part = Part::bytes(image)
            .file_name(file_name.to_string())
            .mime_str(IMAGE_MIME)?;
        let form = Form::new().part("file", part);

        tracing::debug!(frame_id = %frame_id, endpoint = %self.endpoint, "Sending frame to detector");

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_fail() {
        let client = DetectorClient::new(
            "http://localhost:8001/predict_severity".to_string(),
            Duration::from_secs(5),
        )
        .expect("client builds");
        assert_eq!(client.endpoint, "http://localhost:8001/predict_severity");
    }

    #[test]
    fn error_display_http_status() {
        let err = DetectorError::HttpStatus {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Detector returned HTTP 502: bad gateway");
    }

    #[test]
    fn error_display_not_json() {
        let err = DetectorError::NotJson {
            content_type: "text/html".to_string(),
            body: "<h1>hi</h1>".to_string(),
        };
        assert!(err.to_string().contains("content-type: text/html"));
    }

    #[test]
    fn error_display_request() {
        let req_err = reqwest::Client::new().get("://bad").build().unwrap_err();
        let err = DetectorError::Request(req_err);
        assert!(err.to_string().contains("HTTP request failed"));
    }
}
