use crate::api::ErrorResponse;
use crate::models::User;
use crate::AppState;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::crypto::hash_token;

/// The authenticated user behind a request's `Authorization` header.
///
/// Accepts `Bearer <token>` as well as the `Token <token>` form.
pub struct AuthUser(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidToken,
    Internal,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AuthError::MissingHeader => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided.",
            ),
            AuthError::InvalidHeader => (
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header format",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token."),
            AuthError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to validate token",
            ),
        };

        (status, Json(ErrorResponse::new(error))).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?;
    let value = header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("Token "))
        .ok_or(AuthError::InvalidHeader)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::InvalidHeader);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let app = AppState::from_ref(state);

        match app.store.find_user_by_token(&hash_token(token)) {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => Err(AuthError::InvalidToken),
            Err(e) => {
                tracing::error!("Failed to look up token: {}", e);
                Err(AuthError::Internal)
            }
        }
    }
}
