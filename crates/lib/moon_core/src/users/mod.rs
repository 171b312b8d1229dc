//! Persistent user storage.
//!
//! The auth flow only sees [`UserRepository`]. `PgUserRepository` is the
//! production store; `MemoryUserRepository` backs tests and local runs.

mod memory;
mod pg;

pub use memory::MemoryUserRepository;
pub use pg::PgUserRepository;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{NewUser, User};

/// User store errors.
#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("user not found")]
    NotFound,

    /// A uniqueness constraint (email, phone) was violated.
    #[error("duplicate key")]
    DuplicateKey,

    #[error("user store unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Db(sqlx::Error),
}

impl From<sqlx::Error> for UserStoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => UserStoreError::NotFound,
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                UserStoreError::DuplicateKey
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                UserStoreError::Unavailable(e.to_string())
            }
            other => UserStoreError::Db(other),
        }
    }
}

/// Lookup and persistence of user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<User, UserStoreError>;

    async fn find_by_id(&self, id: &str) -> Result<User, UserStoreError>;

    /// Insert a new user. Fails with `DuplicateKey` if the email is taken.
    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError>;

    /// Overwrite the mutable fields of an existing user.
    async fn update(&self, user: &User) -> Result<(), UserStoreError>;
}
