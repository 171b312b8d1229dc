//! JWT token generation and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different
//! secrets, so one kind can never be accepted as the other.

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims};

/// Access token lifetime: 30 minutes.
pub const ACCESS_TOKEN_TTL_SECS: i64 = 30 * 60;

/// Refresh token lifetime: 7 days.
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound accepted for either lifetime: 1 year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// File name of the persisted access-token secret.
const ACCESS_SECRET_FILE: &str = "jwt-access-secret";

/// File name of the persisted refresh-token secret.
const REFRESH_SECRET_FILE: &str = "jwt-refresh-secret";

/// Signing configuration for [`TokenIssuer`].
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl TokenConfig {
    /// Config with the default lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl_secs: ACCESS_TOKEN_TTL_SECS,
            refresh_ttl_secs: REFRESH_TOKEN_TTL_SECS,
        }
    }

    /// Reads configuration from environment variables.
    ///
    /// | Variable                 | Default                          |
    /// |--------------------------|----------------------------------|
    /// | `JWT_ACCESS_SECRET`      | generated & persisted to file    |
    /// | `JWT_REFRESH_SECRET`     | generated & persisted to file    |
    /// | `ACCESS_TOKEN_TTL_SECS`  | `1800`                           |
    /// | `REFRESH_TOKEN_TTL_SECS` | `604800`                         |
    pub fn from_env() -> Self {
        Self {
            access_secret: resolve_secret("JWT_ACCESS_SECRET", ACCESS_SECRET_FILE),
            refresh_secret: resolve_secret("JWT_REFRESH_SECRET", REFRESH_SECRET_FILE),
            access_ttl_secs: env_secs("ACCESS_TOKEN_TTL_SECS", ACCESS_TOKEN_TTL_SECS),
            refresh_ttl_secs: env_secs("REFRESH_TOKEN_TTL_SECS", REFRESH_TOKEN_TTL_SECS),
        }
    }
}

fn env_secs(var: &str, default: i64) -> i64 {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Issues and validates access and refresh tokens.
pub struct TokenIssuer {
    access_enc: EncodingKey,
    access_dec: DecodingKey,
    refresh_enc: EncodingKey,
    refresh_dec: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    session_ttl: StdDuration,
    validation: Validation,
}

impl TokenIssuer {
    /// Build an issuer from config. Secrets must be non-empty and distinct;
    /// lifetimes must lie in `1..=MAX_TOKEN_TTL_SECS`.
    pub fn new(config: &TokenConfig) -> Result<Self, AuthError> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            return Err(AuthError::Internal("jwt secrets must not be empty".into()));
        }
        if config.access_secret == config.refresh_secret {
            return Err(AuthError::Internal(
                "access and refresh secrets must differ".into(),
            ));
        }

        let access_ttl = checked_ttl("access_ttl_secs", config.access_ttl_secs)?;
        let refresh_ttl = checked_ttl("refresh_ttl_secs", config.refresh_ttl_secs)?;
        let session_ttl = refresh_ttl
            .to_std()
            .map_err(|e| AuthError::Internal(format!("refresh_ttl_secs: {e}")))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(Self {
            access_enc: EncodingKey::from_secret(config.access_secret.as_bytes()),
            access_dec: DecodingKey::from_secret(config.access_secret.as_bytes()),
            refresh_enc: EncodingKey::from_secret(config.refresh_secret.as_bytes()),
            refresh_dec: DecodingKey::from_secret(config.refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
            session_ttl,
            validation,
        })
    }

    /// Access token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Refresh token lifetime, also used as the session TTL.
    pub fn refresh_ttl(&self) -> StdDuration {
        self.session_ttl
    }

    /// Sign a short-lived access token for `session_id`.
    pub fn issue_access(&self, user_id: &str, session_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            iat: now.timestamp(),
            exp: expiry(now, self.access_ttl)?,
        };
        sign(&claims, &self.access_enc)
    }

    /// Sign a refresh token for `session_id`.
    pub fn issue_refresh(&self, user_id: &str, session_id: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            sid: session_id.to_string(),
            iat: now.timestamp(),
            exp: expiry(now, self.refresh_ttl)?,
        };
        sign(&claims, &self.refresh_enc)
    }

    /// Verify an access token's signature and expiry.
    pub fn parse_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        verify(token, &self.access_dec, &self.validation)
    }

    /// Verify a refresh token's signature and expiry.
    pub fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        verify(token, &self.refresh_dec, &self.validation)
    }
}

fn checked_ttl(name: &str, secs: i64) -> Result<Duration, AuthError> {
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
        return Err(AuthError::Internal(format!(
            "{name} must be between 1 and {MAX_TOKEN_TTL_SECS} seconds, got {secs}"
        )));
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::Internal(format!("{name} out of range: {secs}")))
}

fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(ttl)
        .map(|exp| exp.timestamp())
        .ok_or_else(|| AuthError::Internal("token expiry out of range".into()))
}

fn sign<C: Serialize>(claims: &C, key: &EncodingKey) -> Result<String, AuthError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

fn verify<C: DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> Result<C, AuthError> {
    decode::<C>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })
}

/// Resolve a signing secret: env var `var` → persisted file `file_name` in the
/// data directory → freshly generated (and persisted) secret.
pub fn resolve_secret(var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(var)
        && !secret.is_empty()
    {
        return secret;
    }
    resolve_secret_in(&secret_dir(), file_name)
}

/// File-backed half of [`resolve_secret`].
pub fn resolve_secret_in(dir: &Path, file_name: &str) -> String {
    let secret_path = dir.join(file_name);
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Err(e) = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&secret_path, &secret))
    {
        warn!(path = %secret_path.display(), "could not persist JWT secret: {e}");
    } else {
        info!(path = %secret_path.display(), "generated new JWT secret");
    }
    secret
}

/// Directory holding persisted secrets.
fn secret_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moon")
}
