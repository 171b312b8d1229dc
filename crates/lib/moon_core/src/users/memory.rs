//! In-memory user store.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::{UserRepository, UserStoreError};
use crate::models::auth::{NewUser, User};

/// User store held in process memory.
#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: DashMap<String, User>,
    by_email: DashMap<String, String>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<User, UserStoreError> {
        let id = self
            .by_email
            .get(email)
            .map(|r| r.value().clone())
            .ok_or(UserStoreError::NotFound)?;
        self.find_by_id(&id).await
    }

    async fn find_by_id(&self, id: &str) -> Result<User, UserStoreError> {
        self.users
            .get(id)
            .map(|r| r.value().clone())
            .ok_or(UserStoreError::NotFound)
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserStoreError> {
        // Reserve the email first so concurrent signups cannot both win.
        let id = uuid::Uuid::new_v4().to_string();
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => return Err(UserStoreError::DuplicateKey),
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }
        let now = Utc::now();
        let row = User {
            id: id.clone(),
            email: user.email,
            password_hash: user.password_hash,
            nickname: user.nickname,
            birthday: None,
            about_me: String::new(),
            phone: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, user: &User) -> Result<(), UserStoreError> {
        if let Some(phone) = &user.phone {
            let taken = self
                .users
                .iter()
                .any(|r| r.key() != &user.id && r.phone.as_ref() == Some(phone));
            if taken {
                return Err(UserStoreError::DuplicateKey);
            }
        }
        let mut stored = self.users.get_mut(&user.id).ok_or(UserStoreError::NotFound)?;
        stored.nickname = user.nickname.clone();
        stored.birthday = user.birthday;
        stored.about_me = user.about_me.clone();
        stored.phone = user.phone.clone();
        stored.updated_at = Utc::now();
        Ok(())
    }
}
