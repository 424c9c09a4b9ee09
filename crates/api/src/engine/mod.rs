//! Out-of-band processing of ingested frames.
//!
//! Contains the enrichment dispatcher that obtains detection verdicts from
//! the external detector and reconciles them into the frame store.

pub mod enrichment;

pub use enrichment::{EnrichmentDispatcher, EnrichmentError, EnrichmentJob};
