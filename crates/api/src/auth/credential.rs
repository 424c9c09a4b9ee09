//! Credential verification shared by every privileged entry point.
//!
//! The streaming upgrade (token in the query string) and the Bearer
//! extractor (token in the `Authorization` header) both funnel through
//! [`verify_credential`], so the two paths cannot drift apart.

use jsonwebtoken::errors::ErrorKind;

use crate::auth::jwt::{validate_token, JwtConfig};

/// Why a credential was refused.
///
/// Clients only ever see "refused"; the variants exist for server-side
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("missing credential")]
    Missing,

    #[error("invalid credential")]
    Invalid,

    #[error("expired credential")]
    Expired,
}

/// Identity derived from a verified credential.
///
/// Lives for one connection or request and carries no mutable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedSession {
    pub subject: String,
}

/// Verify a presented token and derive the session identity.
///
/// A missing or blank token is [`CredentialError::Missing`]; an elapsed
/// `exp` is [`CredentialError::Expired`]; anything else that fails
/// structure or signature checks is [`CredentialError::Invalid`].
pub fn verify_credential(
    token: Option<&str>,
    config: &JwtConfig,
) -> Result<AuthenticatedSession, CredentialError> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(CredentialError::Missing)?;

    let claims = validate_token(token, config).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => CredentialError::Expired,
        _ => CredentialError::Invalid,
    })?;

    Ok(AuthenticatedSession {
        subject: claims.sub,
    })
}
