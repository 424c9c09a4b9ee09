//! Frame ingestion API server library.
//!
//! Exposes the building blocks (config, state, auth, ingest, enrichment,
//! routes) so integration tests and the binary entrypoint can both access
//! them.

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod state;
