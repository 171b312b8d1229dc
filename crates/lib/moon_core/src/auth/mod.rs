//! Authentication and session lifecycle.
//!
//! Provides password hashing, signed access/refresh tokens, the cache-backed
//! session registry and the flows (signup, login, refresh, logout) that tie
//! them together.

pub mod flow;
pub mod jwt;
pub mod password;
pub mod session;

use thiserror::Error;

use crate::cache::CacheError;
use crate::users::UserStoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Never says which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account already exists")]
    DuplicateAccount,

    /// Password did not match the stored hash.
    #[error("Password mismatch")]
    PasswordMismatch,

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for AuthError {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            CacheError::Encoding(msg) => AuthError::Internal(msg),
        }
    }
}

impl From<UserStoreError> for AuthError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::NotFound => AuthError::InvalidCredentials,
            UserStoreError::DuplicateKey => AuthError::DuplicateAccount,
            UserStoreError::Unavailable(msg) => AuthError::StoreUnavailable(msg),
            UserStoreError::Db(e) => AuthError::DbError(e),
        }
    }
}

/// Shorten a session id for log output.
pub(crate) fn short_sid(session_id: &str) -> &str {
    session_id.get(..8).unwrap_or(session_id)
}
