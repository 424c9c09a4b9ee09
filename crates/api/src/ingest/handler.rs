use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::StreamExt;
use serde::Deserialize;

use crate::auth::{verify_credential, AuthenticatedSession};
use crate::ingest::ingestor::{FrameIngestor, IngestError};
use crate::state::AppState;

/// Query parameters accepted by the streaming endpoint.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Bearer credential; the mobile client cannot set headers on upgrade.
    pub token: Option<String>,
}

/// GET /ws?token=... -- upgrade to the frame stream.
///
/// The credential is verified before any frame is read. A refused client
/// gets a Close frame with the policy-violation code and nothing else.
pub async fn stream_ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<StreamParams>,
    State(state): State<AppState>,
) -> Response {
    match verify_credential(params.token.as_deref(), &state.config.jwt) {
        Ok(session) => {
            ws.on_upgrade(move |socket| handle_stream_socket(socket, session, state.ingestor))
        }
        Err(reason) => {
            tracing::warn!(reason = %reason, "Refusing stream connection");
            ws.on_upgrade(refuse_socket)
        }
    }
}

/// Close a freshly upgraded socket with the policy-violation code.
async fn refuse_socket(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "authentication failed".into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Failed to send close frame to refused client");
    }
}

/// Drive one authenticated stream until the client disconnects.
///
/// Bad messages and storage failures are logged and skipped; only a
/// transport-level close or error ends the loop. Enrichment tasks spawned
/// for this connection's frames outlive it.
async fn handle_stream_socket(
    socket: WebSocket,
    session: AuthenticatedSession,
    ingestor: Arc<FrameIngestor>,
) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, subject = %session.subject, "Stream connected");

    let (_sink, mut stream) = socket.split();
    let mut accepted: u64 = 0;
    let mut skipped: u64 = 0;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match ingestor.ingest(text.as_str()).await {
                Ok(frame_id) => {
                    accepted += 1;
                    tracing::debug!(conn_id = %conn_id, frame_id = %frame_id, "Frame ingested");
                }
                Err(IngestError::Malformed(e)) => {
                    skipped += 1;
                    tracing::warn!(conn_id = %conn_id, error = %e, "Skipping malformed frame message");
                }
                Err(e) => {
                    skipped += 1;
                    tracing::error!(
                        conn_id = %conn_id,
                        frame_id = ?e.frame_id(),
                        stage = e.stage(),
                        error = %e,
                        "Failed to store frame, skipping",
                    );
                }
            },
            Ok(Message::Binary(_)) => {
                skipped += 1;
                tracing::warn!(conn_id = %conn_id, "Ignoring binary message, frames must be text");
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // ping / pong
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "Stream receive error");
                break;
            }
        }
    }

    tracing::info!(conn_id = %conn_id, accepted, skipped, "Stream disconnected");
}
