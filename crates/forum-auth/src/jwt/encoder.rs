//! JWT token creation.
//!
//! Tokens are normally minted by the auth service; this encoder produces
//! the same format for tooling and tests.

use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use forum_core::config::AuthConfig;
use forum_core::error::AppError;

use super::claims::Claims;

/// Creates signed HS256 tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        }
    }

    /// Signs the given claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }

    /// Issues a token for a user that expires after `ttl`.
    pub fn issue(
        &self,
        user_id: &str,
        username: &str,
        role: &str,
        ttl: chrono::Duration,
    ) -> Result<String, AppError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            username: Some(username.to_string()),
            email: None,
            role: role.to_string(),
            exp: (Utc::now() + ttl).timestamp(),
        };
        self.encode(&claims)
    }
}
