//! Request extractors for authenticated HTTP endpoints.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated subject from a JWT Bearer token.

pub mod auth;
