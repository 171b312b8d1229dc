//! Signup, login, refresh and logout.
//!
//! Credential and token failures collapse into user-safe errors here
//! (`InvalidCredentials`, `Unauthorized`); store and internal errors pass
//! through unchanged so the caller can log them.

use std::sync::Arc;

use tracing::{info, warn};

use super::jwt::TokenIssuer;
use super::password::{hash_password, verify_dummy, verify_password};
use super::session::{SessionStore, new_session_id};
use super::{AuthError, short_sid};
use crate::models::auth::{Identity, NewUser, ProfileUpdate, TokenPair, User};
use crate::users::{UserRepository, UserStoreError};

/// Orchestrates the authentication lifecycle.
#[derive(Clone)]
pub struct AuthFlow {
    users: Arc<dyn UserRepository>,
    sessions: SessionStore,
    tokens: Arc<TokenIssuer>,
}

impl AuthFlow {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: SessionStore,
        tokens: Arc<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            sessions,
            tokens,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Create an account. An email that is already registered is
    /// `DuplicateAccount`; the existing record is left alone.
    pub async fn signup(&self, email: &str, password: &str, nickname: &str) -> Result<(), AuthError> {
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::Hashing(format!("hash task: {e}")))??;

        let user = self
            .users
            .insert(NewUser {
                email: email.to_string(),
                password_hash,
                nickname: nickname.to_string(),
            })
            .await
            .map_err(|e| match e {
                UserStoreError::DuplicateKey => AuthError::DuplicateAccount,
                other => AuthError::from(other),
            })?;

        info!(user_id = %user.id, "user signed up");
        Ok(())
    }

    /// Check credentials and open a new session.
    ///
    /// The session is registered before any token is signed, so a token can
    /// never outlive a failed login.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let password = password.to_string();
        let user = match self.users.find_by_email(email).await {
            Ok(user) => user,
            Err(UserStoreError::NotFound) => {
                let _ = tokio::task::spawn_blocking(move || verify_dummy(&password)).await;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let hash = user.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AuthError::Hashing(format!("verify task: {e}")))?;
        match verified {
            Ok(()) => {}
            Err(AuthError::PasswordMismatch) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e),
        }

        let session_id = new_session_id();
        self.sessions
            .create(&session_id, &user.id, self.tokens.refresh_ttl())
            .await?;

        let issued = self
            .tokens
            .issue_access(&user.id, &session_id)
            .and_then(|access| Ok((access, self.tokens.issue_refresh(&user.id, &session_id)?)));
        let (access_token, refresh_token) = match issued {
            Ok(pair) => pair,
            Err(e) => {
                if let Err(revoke_err) = self.sessions.revoke(&session_id).await {
                    warn!(sid = short_sid(&session_id), "revoking orphan session: {revoke_err}");
                }
                return Err(e);
            }
        };

        info!(user_id = %user.id, sid = short_sid(&session_id), "user logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
            session_id,
        })
    }

    /// Mint a new access token for the session a refresh token belongs to.
    /// The session id is kept; any failure is `Unauthorized`.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self
            .tokens
            .parse_refresh(refresh_token)
            .map_err(|_| AuthError::Unauthorized)?;

        if let Err(e) = self.sessions.check_live(&claims.sid, &claims.sub).await {
            if let AuthError::StoreUnavailable(msg) = &e {
                warn!(sid = short_sid(&claims.sid), "session check failed: {msg}");
            }
            return Err(AuthError::Unauthorized);
        }

        self.tokens
            .issue_access(&claims.sub, &claims.sid)
            .map_err(|_| AuthError::Unauthorized)
    }

    /// Resolve an access token to the caller's identity, checking that its
    /// session is still live. Errors are left unmapped for the caller.
    pub async fn authenticate(&self, access_token: &str) -> Result<Identity, AuthError> {
        let claims = self.tokens.parse_access(access_token)?;
        self.sessions.check_live(&claims.sid, &claims.sub).await?;
        Ok(claims.into())
    }

    /// End a session. Unknown sessions are fine.
    pub async fn logout(&self, session_id: &str) -> Result<(), AuthError> {
        self.sessions.revoke(session_id).await
    }

    /// Load the caller's profile.
    pub async fn profile(&self, user_id: &str) -> Result<User, AuthError> {
        Ok(self.users.find_by_id(user_id).await?)
    }

    /// Apply a profile update and return the stored result.
    pub async fn update_profile(
        &self,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let mut user = self.users.find_by_id(user_id).await?;
        update.apply(&mut user);
        self.users.update(&user).await.map_err(|e| match e {
            UserStoreError::DuplicateKey => {
                AuthError::Validation("Phone number already in use".into())
            }
            other => other.into(),
        })?;
        self.profile(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenConfig;
    use crate::cache::MemoryCache;
    use crate::users::MemoryUserRepository;

    fn flow() -> AuthFlow {
        let tokens = TokenIssuer::new(&TokenConfig::new("access-secret", "refresh-secret")).unwrap();
        AuthFlow::new(
            Arc::new(MemoryUserRepository::new()),
            SessionStore::new(Arc::new(MemoryCache::new())),
            Arc::new(tokens),
        )
    }

    #[tokio::test]
    async fn signup_login_request_logout_scenario() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let pair = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();

        let identity = flow.authenticate(&pair.access_token).await.unwrap();
        assert_eq!(identity.session_id, pair.session_id);

        flow.logout(&identity.session_id).await.unwrap();
        assert!(matches!(
            flow.authenticate(&pair.access_token).await,
            Err(AuthError::SessionNotFound)
        ));
        assert!(matches!(
            flow.refresh(&pair.refresh_token).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn duplicate_signup_keeps_original_record() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let before = flow.users.find_by_email("a@x.com").await.unwrap();
        assert!(matches!(
            flow.signup("a@x.com", "Other#pass9", "Bob").await,
            Err(AuthError::DuplicateAccount)
        ));
        let after = flow.users.find_by_email("a@x.com").await.unwrap();
        assert_eq!(before, after);
        flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let wrong_password = flow.login("a@x.com", "nope").await.unwrap_err();
        let unknown_email = flow.login("b@x.com", "P@ssw0rd1").await.unwrap_err();
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn two_logins_are_independent_sessions() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let first = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        let second = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        assert_ne!(first.session_id, second.session_id);
        assert_ne!(first.access_token, second.access_token);

        flow.logout(&first.session_id).await.unwrap();
        assert!(flow.authenticate(&first.access_token).await.is_err());
        flow.authenticate(&second.access_token).await.unwrap();
        flow.refresh(&second.refresh_token).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_keeps_session_id() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let pair = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        let access = flow.refresh(&pair.refresh_token).await.unwrap();
        let claims = flow.tokens().parse_access(&access).unwrap();
        assert_eq!(claims.sid, pair.session_id);
    }

    #[tokio::test]
    async fn refresh_rejects_access_tokens_and_garbage() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let pair = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        assert!(matches!(
            flow.refresh(&pair.access_token).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            flow.refresh("garbage").await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn token_for_someone_elses_session_is_rejected() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let pair = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        let access = flow.tokens().issue_access("intruder", &pair.session_id).unwrap();
        let refresh = flow.tokens().issue_refresh("intruder", &pair.session_id).unwrap();
        assert!(matches!(
            flow.authenticate(&access).await,
            Err(AuthError::SessionNotFound)
        ));
        assert!(matches!(
            flow.refresh(&refresh).await,
            Err(AuthError::Unauthorized)
        ));
        flow.authenticate(&pair.access_token).await.unwrap();
    }

    #[test]
    fn oversized_token_lifetime_is_rejected_up_front() {
        let mut config = TokenConfig::new("access-secret", "refresh-secret");
        config.refresh_ttl_secs = 1_000_000_000_000_000;
        assert!(TokenIssuer::new(&config).is_err());
    }

    #[tokio::test]
    async fn logout_of_unknown_session_succeeds() {
        flow().logout("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn profile_update_round_trip() {
        let flow = flow();
        flow.signup("a@x.com", "P@ssw0rd1", "Ann").await.unwrap();
        let pair = flow.login("a@x.com", "P@ssw0rd1").await.unwrap();
        let identity = flow.authenticate(&pair.access_token).await.unwrap();

        let updated = flow
            .update_profile(
                &identity.user_id,
                ProfileUpdate {
                    nickname: Some("Annie".into()),
                    about_me: Some("hello".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nickname, "Annie");
        assert_eq!(updated.about_me, "hello");
        assert_eq!(flow.profile(&identity.user_id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn profile_of_unknown_user_fails() {
        assert!(matches!(
            flow().profile("missing").await,
            Err(AuthError::InvalidCredentials)
        ));
    }
}
