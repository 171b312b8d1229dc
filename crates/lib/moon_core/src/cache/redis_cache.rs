//! Redis cache backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{ErrorKind, RedisError};
use tracing::info;

use super::{CacheError, KvCache};

/// Cache backed by a Redis server. Expiry is Redis' own key TTL.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to `url` (e.g. `redis://127.0.0.1:6379/`). The connection
    /// manager reconnects on its own after the first successful connect.
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(map_redis_err)?;
        let conn = ConnectionManager::new(client).await.map_err(map_redis_err)?;
        info!("connected to redis");
        Ok(Self { conn })
    }
}

fn map_redis_err(e: RedisError) -> CacheError {
    match e.kind() {
        ErrorKind::TypeError => CacheError::Encoding(e.to_string()),
        _ => CacheError::Unavailable(e.to_string()),
    }
}

#[async_trait]
impl KvCache for RedisCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let millis = u64::try_from(ttl.as_millis())
            .map_err(|_| CacheError::Encoding(format!("ttl out of range: {ttl:?}")))?;
        // Redis rejects a zero expiry; an already-expired entry is a missing one.
        if millis == 0 {
            let _: i64 = redis::cmd("DEL")
                .arg(key)
                .query_async(&mut conn)
                .await
                .map_err(map_redis_err)?;
            return Ok(());
        }
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(map_redis_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_unavailable() {
        let err = RedisError::from((ErrorKind::IoError, "connection refused"));
        assert!(matches!(map_redis_err(err), CacheError::Unavailable(_)));
    }

    #[test]
    fn type_errors_are_encoding() {
        let err = RedisError::from((ErrorKind::TypeError, "not a string"));
        assert!(matches!(map_redis_err(err), CacheError::Encoding(_)));
    }

    #[tokio::test]
    async fn malformed_url_is_unavailable() {
        assert!(matches!(
            RedisCache::connect("not-a-redis-url").await,
            Err(CacheError::Unavailable(_))
        ));
    }
}
