//! JWT access-token validation.
//!
//! Tokens are issued by the account service, HS256-signed with a shared
//! secret, and carry the subject (the account e-mail) plus an expiry.

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the account identity the token was issued to.
    pub sub: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp). Older tokens omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

/// Configuration for JWT validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the token issuer.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var      | Required | Default |
    /// |--------------|----------|---------|
    /// | `JWT_SECRET` | **yes**  | --      |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks structure, signature and expiry.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
