//! Shared domain types for the frame ingestion pipeline.

pub mod blob;
pub mod error;
pub mod frame;
pub mod types;
pub mod verdict;
