use crate::api::ErrorResponse;
use crate::db::DbPool;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use super::db::get_user_from_token;

/// Extractor that validates the Authorization header and provides the
/// authenticated user together with the session the request came in on.
///
/// ```ignore
/// async fn my_handler(AuthUser { user, .. }: AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser {
    pub user: User,
    pub session_id: Uuid,
}

#[derive(Debug, PartialEq)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Missing Authorization header",
            AuthError::InvalidHeader => "Invalid Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization header format",
            AuthError::InvalidToken => "Invalid or expired token",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    auth_str
        .strip_prefix("Bearer ")
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);
        let token = bearer_token(&parts.headers)?;

        let (session_id, user) =
            get_user_from_token(&pool, token).ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser { user, session_id })
    }
}
