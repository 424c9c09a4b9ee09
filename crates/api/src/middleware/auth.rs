//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use roadscan_core::error::CoreError;

use crate::auth::{verify_credential, CredentialError};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(subject = %user.subject, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Subject claim of the verified token.
    pub subject: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => Some(
                value
                    .to_str()
                    .ok()
                    .and_then(|v| v.strip_prefix("Bearer "))
                    .ok_or_else(|| reject(CredentialError::Invalid))?,
            ),
        };

        let session = verify_credential(token, &state.config.jwt).map_err(reject)?;

        Ok(AuthUser {
            subject: session.subject,
        })
    }
}

fn reject(reason: CredentialError) -> AppError {
    tracing::warn!(reason = %reason, "Rejecting request credential");
    AppError::Core(CoreError::Unauthorized(
        "Missing, invalid or expired token".into(),
    ))
}
