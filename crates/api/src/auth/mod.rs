//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 token generation and validation.
//! - [`credential`] -- the single credential check shared by the streaming
//!   upgrade and the Bearer-header extractor.

pub mod credential;
pub mod jwt;

pub use credential::{verify_credential, AuthenticatedSession, CredentialError};
