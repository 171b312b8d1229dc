//! Application error types.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use moon_core::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Access token signature is fine but it has expired; the client should
    /// go through the refresh route.
    #[error("Token expired")]
    TokenExpired,

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// The one rejection every gate failure except expiry collapses into.
    pub fn unauthorized() -> Self {
        AppError::Unauthorized("Unauthorized".into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.as_str()),
            AppError::Conflict(m) => (StatusCode::CONFLICT, "conflict", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired", "Token expired"),
            AppError::Unavailable(m) => {
                warn!("service unavailable: {m}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Service temporarily unavailable",
                )
            }
            AppError::Internal(m) => {
                error!("internal error: {m}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        let mut response = (status, body).into_response();
        if matches!(self, AppError::TokenExpired) {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static(
                    r#"Bearer error="invalid_token", error_description="token expired""#,
                ),
            );
        }
        response
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::PasswordMismatch => {
                AppError::Unauthorized("Invalid credentials".into())
            }
            AuthError::DuplicateAccount => AppError::Conflict("Email already registered".into()),
            AuthError::TokenExpired => AppError::TokenExpired,
            AuthError::TokenInvalid | AuthError::SessionNotFound | AuthError::Unauthorized => {
                AppError::unauthorized()
            }
            AuthError::Validation(msg) => AppError::Validation(msg),
            AuthError::StoreUnavailable(msg) => AppError::Unavailable(msg),
            AuthError::Hashing(msg) | AuthError::Internal(msg) => AppError::Internal(msg),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_errors_share_one_message() {
        let a = AppError::from(AuthError::InvalidCredentials);
        let b = AppError::from(AuthError::PasswordMismatch);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn expired_token_has_its_own_code_and_challenge() {
        let resp = AppError::from(AuthError::TokenExpired).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let challenge = resp.headers().get(WWW_AUTHENTICATE).unwrap();
        assert!(challenge.to_str().unwrap().contains("token expired"));
    }

    #[test]
    fn invalid_token_has_no_challenge_detail() {
        let resp = AppError::from(AuthError::TokenInvalid).into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (AuthError::DuplicateAccount, StatusCode::CONFLICT),
            (AuthError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                AuthError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AuthError::Hashing("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (AuthError::SessionNotFound, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }
}
