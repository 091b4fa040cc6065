//! JWT claims issued by the auth service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use forum_core::types::{UserId, UserInfo};

/// JWT claims payload embedded in every access token.
///
/// Older tokens carry `email` instead of `username`; either may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The user ID.
    pub user_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role at the time of issuance.
    #[serde(default = "default_role")]
    pub role: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

fn default_role() -> String {
    "user".to_string()
}

impl Claims {
    /// Returns the user ID.
    pub fn user_id(&self) -> UserId {
        UserId::from(self.user_id.as_str())
    }

    /// Name to show for the user: username, else the email's local part, else the ID.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.username.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(&self.user_id)
            .to_string()
    }

    /// Profile data carried by the token.
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            user_id: self.user_id(),
            username: self.display_name(),
            role: self.role.clone(),
        }
    }

    /// Returns the expiration as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}
