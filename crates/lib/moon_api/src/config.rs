//! API server configuration.

use moon_core::auth::jwt::TokenConfig;

/// Default per-request deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Token signing secrets and lifetimes.
    pub tokens: TokenConfig,
    /// Deadline for a whole request, store and cache calls included.
    pub request_timeout_secs: u64,
    /// Allowed CORS origin. `None` mirrors the request origin.
    pub cors_origin: Option<String>,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                          |
    /// |------------------------|----------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:8080`                 |
    /// | `DATABASE_URL`         | `postgres://localhost:5432/moon` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                             |
    /// | `CORS_ORIGIN`          | unset (mirror request origin)    |
    ///
    /// Token settings are read by [`TokenConfig::from_env`].
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            pg_connection_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost:5432/moon".into()),
            tokens: TokenConfig::from_env(),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
        }
    }
}
