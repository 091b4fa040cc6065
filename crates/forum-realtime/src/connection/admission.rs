//! Connection admission. Resolves the bearer token before any upgrade.

use std::sync::Arc;

use tracing::debug;

use forum_core::error::{AppError, ErrorKind};
use forum_core::traits::AuthValidator;
use forum_core::types::{UserId, UserInfo};

/// Gates new chat connections on a valid bearer token.
#[derive(Clone)]
pub struct Admission {
    /// Token authority.
    validator: Arc<dyn AuthValidator>,
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admission").finish()
    }
}

impl Admission {
    /// Creates a new admission gate.
    pub fn new(validator: Arc<dyn AuthValidator>) -> Self {
        Self { validator }
    }

    /// Resolves the token supplied on the upgrade request to a user identity.
    ///
    /// A missing or blank token is rejected without consulting the
    /// validator. Any validator error is terminal for this attempt.
    pub async fn admit(&self, token: Option<&str>) -> Result<UserId, AppError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::authentication("Missing bearer token"))?;

        match self.validator.validate_token(token).await {
            Ok(user_id) => Ok(user_id),
            Err(e) if e.kind == ErrorKind::Authentication => {
                debug!(error = %e, "Chat connection refused");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Like [`Self::admit`], but also resolves the caller's profile.
    ///
    /// The profile is looked up immediately after validation, while the
    /// token's claims are freshly cached, and is then owned by the caller
    /// for the life of the connection.
    pub async fn admit_profile(&self, token: Option<&str>) -> Result<UserInfo, AppError> {
        let user_id = self.admit(token).await?;
        self.validator.get_user_info(&user_id).await
    }
}
