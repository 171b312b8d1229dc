//! PostgreSQL user store against a live database.
//!
//! Runs only when `TEST_DATABASE_URL` points at a scratch database; the
//! migrations are applied on connect.

use moon_core::models::auth::NewUser;
use moon_core::users::{PgUserRepository, UserRepository, UserStoreError};
use sqlx::postgres::PgPoolOptions;

async fn repo() -> Option<PgUserRepository> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to test database");
    let repo = PgUserRepository::new(pool);
    repo.migrate().await.expect("run migrations");
    Some(repo)
}

/// Email that no earlier run has used.
fn fresh_email() -> String {
    format!("{}@test.moon", uuid::Uuid::new_v4().simple())
}

fn new_user(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "$2b$10$notarealhash".to_string(),
        nickname: "Ann".to_string(),
    }
}

#[tokio::test]
async fn insert_then_find_by_email_and_id() {
    let Some(repo) = repo().await else { return };
    let email = fresh_email();
    let created = repo.insert(new_user(&email)).await.unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    assert_eq!(created.email, email);
    assert_eq!(created.about_me, "");
    assert!(created.phone.is_none());

    let by_email = repo.find_by_email(&email).await.unwrap();
    assert_eq!(by_email.id, created.id);
    let by_id = repo.find_by_id(&created.id).await.unwrap();
    assert_eq!(by_id.email, email);
}

#[tokio::test]
async fn duplicate_email_is_duplicate_key() {
    let Some(repo) = repo().await else { return };
    let email = fresh_email();
    let original = repo.insert(new_user(&email)).await.unwrap();

    let mut dup = new_user(&email);
    dup.nickname = "Mallory".into();
    assert!(matches!(
        repo.insert(dup).await,
        Err(UserStoreError::DuplicateKey)
    ));
    assert_eq!(repo.find_by_email(&email).await.unwrap().nickname, original.nickname);
}

#[tokio::test]
async fn missing_and_malformed_ids_are_not_found() {
    let Some(repo) = repo().await else { return };
    assert!(matches!(
        repo.find_by_id("not-a-uuid").await,
        Err(UserStoreError::NotFound)
    ));
    let unknown = uuid::Uuid::new_v4().to_string();
    assert!(matches!(
        repo.find_by_id(&unknown).await,
        Err(UserStoreError::NotFound)
    ));
    assert!(matches!(
        repo.find_by_email(&fresh_email()).await,
        Err(UserStoreError::NotFound)
    ));
}

#[tokio::test]
async fn update_persists_profile_and_rejects_taken_phone() {
    let Some(repo) = repo().await else { return };
    let mut a = repo.insert(new_user(&fresh_email())).await.unwrap();
    let mut b = repo.insert(new_user(&fresh_email())).await.unwrap();
    let phone = format!("+1{}", &uuid::Uuid::new_v4().simple().to_string()[..10]);

    a.nickname = "Annie".into();
    a.about_me = "hello".into();
    a.phone = Some(phone.clone());
    repo.update(&a).await.unwrap();
    let stored = repo.find_by_id(&a.id).await.unwrap();
    assert_eq!(stored.nickname, "Annie");
    assert_eq!(stored.about_me, "hello");
    assert_eq!(stored.phone.as_deref(), Some(phone.as_str()));

    b.phone = Some(phone);
    assert!(matches!(
        repo.update(&b).await,
        Err(UserStoreError::DuplicateKey)
    ));
}

#[tokio::test]
async fn update_of_unknown_user_is_not_found() {
    let Some(repo) = repo().await else { return };
    let mut ghost = repo.insert(new_user(&fresh_email())).await.unwrap();
    ghost.id = uuid::Uuid::new_v4().to_string();
    assert!(matches!(
        repo.update(&ghost).await,
        Err(UserStoreError::NotFound)
    ));
}
