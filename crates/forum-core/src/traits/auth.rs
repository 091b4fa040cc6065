//! Token validation and user lookup.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{UserId, UserInfo};

/// Resolves bearer tokens into user identities and answers user questions.
///
/// Implementations talk to whatever authority issues tokens. Errors from
/// `validate_token` are terminal for a connection attempt; the hub never
/// retries them.
#[async_trait]
pub trait AuthValidator: Send + Sync + 'static {
    /// Validate a bearer token and return the identity it was issued to.
    async fn validate_token(&self, token: &str) -> AppResult<UserId>;

    /// Whether the user holds the admin role.
    async fn is_admin(&self, user_id: &UserId) -> AppResult<bool>;

    /// Look up the user's profile, mainly for the display name.
    async fn get_user_info(&self, user_id: &UserId) -> AppResult<UserInfo>;
}
