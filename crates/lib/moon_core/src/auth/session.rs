//! Session registry backed by the key/value cache.
//!
//! A live session is a cache record under `users:ssid:<sid>`. Expiry is the
//! cache's TTL; revocation deletes the record.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::{AuthError, short_sid};
use crate::cache::KvCache;
use crate::models::auth::SessionRecord;

/// Cache key prefix for session records.
const SESSION_KEY_PREFIX: &str = "users:ssid:";

/// Generate a fresh opaque session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Registry of live login sessions.
#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn KvCache>,
}

impl SessionStore {
    pub fn new(cache: Arc<dyn KvCache>) -> Self {
        Self { cache }
    }

    fn key(session_id: &str) -> String {
        format!("{SESSION_KEY_PREFIX}{session_id}")
    }

    /// Register `session_id` as live for `ttl`. Calling again with the same id
    /// overwrites the record and restarts its TTL.
    pub async fn create(
        &self,
        session_id: &str,
        user_id: &str,
        ttl: Duration,
    ) -> Result<(), AuthError> {
        let record = SessionRecord {
            user_id: user_id.to_string(),
            created_at: Utc::now(),
        };
        let value = serde_json::to_string(&record)
            .map_err(|e| AuthError::Internal(format!("session encode: {e}")))?;
        self.cache.set(&Self::key(session_id), value, ttl).await?;
        info!(sid = short_sid(session_id), user_id, "session created");
        Ok(())
    }

    /// Fetch the record of a live session.
    pub async fn get(&self, session_id: &str) -> Result<SessionRecord, AuthError> {
        let raw = self
            .cache
            .get(&Self::key(session_id))
            .await?
            .ok_or(AuthError::SessionNotFound)?;
        serde_json::from_str(&raw).map_err(|e| AuthError::Internal(format!("session decode: {e}")))
    }

    /// Succeeds only while the session exists, has not expired and belongs
    /// to `user_id`.
    pub async fn check_live(&self, session_id: &str, user_id: &str) -> Result<(), AuthError> {
        let record = match self.get(session_id).await {
            Ok(record) => record,
            Err(AuthError::SessionNotFound) => {
                debug!(sid = short_sid(session_id), "session not live");
                return Err(AuthError::SessionNotFound);
            }
            Err(e) => return Err(e),
        };
        if record.user_id != user_id {
            warn!(sid = short_sid(session_id), "session owner mismatch");
            return Err(AuthError::SessionNotFound);
        }
        Ok(())
    }

    /// Kill a session immediately. Revoking an unknown session succeeds.
    pub async fn revoke(&self, session_id: &str) -> Result<(), AuthError> {
        self.cache.delete(&Self::key(session_id)).await?;
        info!(sid = short_sid(session_id), "session revoked");
        Ok(())
    }
}
