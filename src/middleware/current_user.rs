use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity of the caller, taken from the `x-user-id` header
///
/// Use `Option<CurrentUser>` for endpoints where identity is optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| AppError::Unauthorized("Missing x-user-id header".to_string()))?;

        raw.to_str()
            .ok()
            .and_then(|s| s.trim().parse::<i64>().ok())
            .map(CurrentUser)
            .ok_or_else(|| AppError::Unauthorized("Malformed x-user-id header".to_string()))
    }
}
