//! Frame ingestion over the streaming WebSocket.
//!
//! - [`handler`] -- upgrade endpoint and per-connection receive loop.
//! - [`ingestor`] -- decode, store, cache and hand off one message.
//! - [`latest`] -- the single-slot latest-frame cache read by viewers.

mod handler;
pub mod ingestor;
pub mod latest;

pub use handler::{stream_ws_handler, StreamParams};
pub use ingestor::{FrameIngestor, IngestError};
pub use latest::{LatestFrameCache, LatestFrameSnapshot};
