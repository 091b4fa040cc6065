//! Token validation configuration.

use serde::{Deserialize, Serialize};

/// Settings for validating bearer tokens issued by the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared HMAC-SHA256 secret the auth service signs tokens with.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Allowed clock skew when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
    /// How long user info learned from a token stays cached, in seconds.
    #[serde(default = "default_user_cache_ttl")]
    pub user_cache_ttl_seconds: u64,
    /// Maximum number of cached users.
    #[serde(default = "default_user_cache_capacity")]
    pub user_cache_capacity: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            leeway_seconds: default_leeway(),
            user_cache_ttl_seconds: default_user_cache_ttl(),
            user_cache_capacity: default_user_cache_capacity(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_leeway() -> u64 {
    5
}

fn default_user_cache_ttl() -> u64 {
    86_400
}

fn default_user_cache_capacity() -> u64 {
    10_000
}
