//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API request/response
//! models in `moon_api` (which carry `#[serde(rename)]` for camelCase etc.).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Domain user, including the stored credential.
///
/// Not `Serialize` on purpose: the password hash must never reach a response
/// body or a cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
    pub birthday: Option<NaiveDate>,
    pub about_me: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub nickname: String,
}

/// Profile fields a user may change. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub nickname: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub about_me: Option<String>,
    pub phone: Option<String>,
}

impl ProfileUpdate {
    /// Apply the update to a user record in place.
    pub fn apply(self, user: &mut User) {
        if let Some(nickname) = self.nickname {
            user.nickname = nickname;
        }
        if let Some(birthday) = self.birthday {
            user.birthday = Some(birthday);
        }
        if let Some(about_me) = self.about_me {
            user.about_me = about_me;
        }
        if let Some(phone) = self.phone {
            user.phone = if phone.is_empty() { None } else { Some(phone) };
        }
    }
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: user ID (standard JWT `sub` claim).
    pub sub: String,
    /// Session the token was minted for.
    pub sid: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// JWT claims embedded in refresh tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject: user ID.
    pub sub: String,
    /// Session the token was minted for.
    pub sid: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// An authenticated caller: who they are and which login session they use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub session_id: String,
}

impl From<AccessClaims> for Identity {
    fn from(claims: AccessClaims) -> Self {
        Self {
            user_id: claims.sub,
            session_id: claims.sid,
        }
    }
}

/// Tokens handed to the client on login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub session_id: String,
}

/// Session record kept in the cache while a login is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}
