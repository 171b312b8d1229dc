//! PostgreSQL user store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::{UserRepository, UserStoreError};
use crate::models::auth::{NewUser, User};

/// Columns selected for every user read, in `UserRow` order.
const USER_COLUMNS: &str = "id::text, email, password_hash, nickname, birthday, about_me, phone, \
                            created_at, updated_at";

/// Row shape of `USER_COLUMNS`.
type UserRow = (
    String,
    String,
    String,
    String,
    Option<NaiveDate>,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn into_user(row: UserRow) -> User {
    let (id, email, password_hash, nickname, birthday, about_me, phone, created_at, updated_at) =
        row;
    User {
        id,
        email,
        password_hash,
        nickname,
        birthday,
        about_me,
        phone,
        created_at,
        updated_at,
    }
}

/// User store backed by the `users` table.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations from `moon_core/migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_user).ok_or(UserStoreError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> Result<User, UserStoreError> {
        // Ids that are not UUIDs cannot exist; avoid a cast error from PG.
        if uuid::Uuid::parse_str(id).is_err() {
            return Err(UserStoreError::NotFound);
        }
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1::uuid"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(into_user).ok_or(UserStoreError::NotFound)
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, password_hash, nickname) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.nickname)
        .fetch_one(&self.pool)
        .await?;
        Ok(into_user(row))
    }

    async fn update(&self, user: &User) -> Result<(), UserStoreError> {
        let result = sqlx::query(
            "UPDATE users SET nickname = $2, birthday = $3, about_me = $4, phone = $5, \
             updated_at = now() WHERE id = $1::uuid",
        )
        .bind(&user.id)
        .bind(&user.nickname)
        .bind(user.birthday)
        .bind(&user.about_me)
        .bind(&user.phone)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(UserStoreError::NotFound);
        }
        Ok(())
    }
}
