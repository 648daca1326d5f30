//! `AuthUser` extractor: reads the caller identity set by the upstream
//! gateway and injects a request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use medshare_core::error::AppError;
use medshare_core::types::UserId;
use medshare_service::context::RequestContext;

use crate::error::ApiError;

/// Header carrying the authenticated user's ID.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Extracted authenticated user context available in handlers.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub RequestContext);

impl AuthUser {
    /// Returns the inner `RequestContext`.
    pub fn context(&self) -> &RequestContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = RequestContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing caller identity"))?;

        let user_id: UserId = raw
            .trim()
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid caller identity"))?;

        Ok(AuthUser(RequestContext::new(user_id)))
    }
}
