//! Bearer token extraction and the `AuthUser` extractor.

use axum::extract::{FromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use forum_core::types::UserInfo;

use crate::dto::request::WsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// The bearer token presented with a request, if any.
///
/// Taken from the `token` query parameter, falling back to an
/// `Authorization: Bearer` header. Browsers cannot set headers on a
/// WebSocket upgrade, hence the query parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    /// Returns the token, if any.
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }

    fn from_parts(parts: &Parts) -> Self {
        let from_query = Query::<WsQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.token)
            .filter(|token| !token.is_empty());

        let from_header = || {
            parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        };

        Self(from_query.or_else(from_header))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// An authenticated caller and the profile their token resolved to.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserInfo);

impl std::ops::Deref for AuthUser {
    type Target = UserInfo;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = BearerToken::from_parts(parts);
        let profile = state.hub.admit_profile(token.as_deref()).await?;
        Ok(Self(profile))
    }
}
