//! JWT-backed [`AuthValidator`].

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use forum_core::config::AuthConfig;
use forum_core::error::AppError;
use forum_core::result::AppResult;
use forum_core::traits::AuthValidator;
use forum_core::types::{UserId, UserInfo};

use crate::jwt::JwtDecoder;

/// Validates tokens locally and remembers the profile each token carried.
///
/// Tokens are self-describing, so the profile of any user who has
/// presented a valid token is known without a round trip to the auth
/// service. Lookups for users never seen fail with `NotFound`.
#[derive(Debug, Clone)]
pub struct JwtAuthValidator {
    /// Token decoder.
    decoder: JwtDecoder,
    /// User ID → profile learned from the latest valid token.
    users: Cache<UserId, UserInfo>,
}

impl JwtAuthValidator {
    /// Creates a validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let users = Cache::builder()
            .max_capacity(config.user_cache_capacity)
            .time_to_live(Duration::from_secs(config.user_cache_ttl_seconds))
            .build();

        Self {
            decoder: JwtDecoder::new(config),
            users,
        }
    }
}

#[async_trait]
impl AuthValidator for JwtAuthValidator {
    async fn validate_token(&self, token: &str) -> AppResult<UserId> {
        let claims = self.decoder.decode(token)?;
        let info = claims.user_info();
        let user_id = info.user_id.clone();

        self.users.insert(user_id.clone(), info).await;
        debug!(user_id = %user_id, "Token validated");

        Ok(user_id)
    }

    async fn is_admin(&self, user_id: &UserId) -> AppResult<bool> {
        Ok(self.get_user_info(user_id).await?.is_admin())
    }

    async fn get_user_info(&self, user_id: &UserId) -> AppResult<UserInfo> {
        self.users
            .get(user_id)
            .await
            .ok_or_else(|| AppError::not_found(format!("Unknown user: {user_id}")))
    }
}
