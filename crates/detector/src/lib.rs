//! Client library for the external pothole detection service.
//!
//! Provides the [`Detector`] seam used by frame enrichment, its HTTP
//! implementation [`DetectorClient`], and the response types.

pub mod client;
pub mod detection;

pub use client::{Detector, DetectorClient, DetectorError};
pub use detection::{verdict_from, Detection};
