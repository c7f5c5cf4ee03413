//! The `x-user-id` extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use prospect_core::lead::UserId;

use crate::error::ApiError;

/// Header carrying the authenticated user, set by the upstream auth provider.
pub const USER_HEADER: &str = "x-user-id";

/// The user every lead route is scoped to.
pub struct UserScope(pub UserId);

impl<T> FromRequestParts<T> for UserScope
where
  T: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &T) -> Result<Self, Self::Rejection> {
    let user = parts
      .headers
      .get(USER_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|v| !v.is_empty())
      .ok_or(ApiError::Unauthorized)?;
    Ok(UserScope(UserId::new(user)))
  }
}
