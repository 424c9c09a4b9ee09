//! Inbound frame messages from mobile clients.
//!
//! Each text message on the streaming socket is a JSON object carrying a
//! base64-encoded JPEG under `image` (or the older `frame` key) plus
//! optional GPS metadata. [`decode_frame_message`] runs the validation
//! steps in order and either yields a [`DecodedFrame`] or reports why the
//! message was rejected. A rejected message never ends the connection.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;

use crate::types::Timestamp;

/// Raw shape of a frame message as sent by the mobile client.
#[derive(Debug, Deserialize)]
struct FrameMessage {
    image: Option<String>,
    frame: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    accuracy: Option<f64>,
    timestamp: Option<String>,
}

/// Why a frame message was skipped.
#[derive(Debug, thiserror::Error)]
pub enum MalformedMessage {
    #[error("message is not a valid frame object: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("message has no 'image' or 'frame' field")]
    MissingImage,

    #[error("image is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// A frame message that passed validation.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Decoded JPEG bytes, ready to be written to blob storage.
    pub image: Vec<u8>,
    /// The image exactly as received, still base64-encoded. Kept for the
    /// latest-frame snapshot so viewers can render it without re-encoding.
    pub image_b64: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub accuracy: Option<f64>,
    /// Capture time; server time when the client omitted it or sent
    /// something unparsable.
    pub captured_at: Timestamp,
}

/// Parse and validate one text message.
///
/// Validation order: the message must be a JSON object, it must carry a
/// non-empty image under `image` or `frame` (`image` wins when both are
/// present), and the image must decode from standard base64. Line breaks
/// inside the base64 are tolerated; `image_b64` keeps them as received.
pub fn decode_frame_message(text: &str) -> Result<DecodedFrame, MalformedMessage> {
    // Deserializing the struct directly would also accept a JSON array.
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text)?;
    let msg: FrameMessage = serde_json::from_value(serde_json::Value::Object(object))?;

    let image_b64 = [msg.image, msg.frame]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .ok_or(MalformedMessage::MissingImage)?;

    let image = BASE64.decode(strip_line_wrapping(&image_b64).as_bytes())?;

    let captured_at = msg
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);

    Ok(DecodedFrame {
        image,
        image_b64,
        lat: msg.lat,
        lon: msg.lon,
        accuracy: msg.accuracy,
        captured_at,
    })
}

/// Drop the ASCII whitespace MIME-style encoders insert every 76 chars.
fn strip_line_wrapping(b64: &str) -> Cow<'_, str> {
    if b64.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(b64.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(b64)
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset) and naive date-times, which are taken
/// to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
