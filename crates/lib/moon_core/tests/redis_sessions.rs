//! Session registry over a live Redis server.
//!
//! Runs only when `TEST_REDIS_URL` is set.

use std::sync::Arc;
use std::time::Duration;

use moon_core::auth::AuthError;
use moon_core::auth::session::{SessionStore, new_session_id};
use moon_core::cache::{KvCache, RedisCache};

async fn cache() -> Option<RedisCache> {
    let Ok(url) = std::env::var("TEST_REDIS_URL") else {
        eprintln!("TEST_REDIS_URL not set, skipping");
        return None;
    };
    Some(RedisCache::connect(&url).await.expect("connect to test redis"))
}

#[tokio::test]
async fn set_get_delete() {
    let Some(cache) = cache().await else { return };
    let key = format!("moon:test:{}", new_session_id());
    cache.set(&key, "v1".into(), Duration::from_secs(60)).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap(), Some("v1".to_string()));
    cache.delete(&key).await.unwrap();
    cache.delete(&key).await.unwrap();
    assert!(cache.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn entries_expire_with_their_ttl() {
    let Some(cache) = cache().await else { return };
    let key = format!("moon:test:{}", new_session_id());
    cache.set(&key, "v".into(), Duration::from_millis(50)).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(cache.get(&key).await.unwrap().is_none());

    cache.set(&key, "v".into(), Duration::ZERO).await.unwrap();
    assert!(cache.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn session_lifecycle_over_redis() {
    let Some(cache) = cache().await else { return };
    let store = SessionStore::new(Arc::new(cache));
    let sid = new_session_id();
    store.create(&sid, "user-1", Duration::from_secs(60)).await.unwrap();
    store.check_live(&sid, "user-1").await.unwrap();
    store.revoke(&sid).await.unwrap();
    assert!(matches!(
        store.check_live(&sid, "user-1").await,
        Err(AuthError::SessionNotFound)
    ));
}
