//! # moon_api
//!
//! HTTP API library for Moon.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use axum::routing::{get, post};
use moon_core::auth::AuthError;
use moon_core::auth::flow::AuthFlow;
use moon_core::auth::jwt::TokenIssuer;
use moon_core::auth::session::SessionStore;
use moon_core::cache::KvCache;
use moon_core::users::UserRepository;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, profile};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Account and session flows.
    pub auth: AuthFlow,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    /// Wire the auth flow from its collaborators.
    pub fn new(
        config: ApiConfig,
        users: Arc<dyn UserRepository>,
        cache: Arc<dyn KvCache>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::new(&config.tokens)?;
        let auth = AuthFlow::new(users, SessionStore::new(cache), Arc::new(tokens));
        Ok(Self { auth, config })
    }
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origin = match config.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            warn!("ignoring invalid CORS_ORIGIN: {e}");
            AllowOrigin::mirror_request()
        }
        None => AllowOrigin::mirror_request(),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([
            HeaderName::from_static(routes::ACCESS_TOKEN_HEADER),
            HeaderName::from_static(routes::REFRESH_TOKEN_HEADER),
        ])
}

/// Builds the Axum router with all routes and shared state.
///
/// The login gate wraps every route; only `routes::PUBLIC_PATHS` pass
/// through without a token.
pub fn router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config);

    Router::new()
        .route(routes::GET_HEALTH, get(health::health))
        .route(routes::POST_USERS_SIGNUP, post(auth::signup_handler))
        .route(routes::POST_USERS_LOGIN, post(auth::login_handler))
        .route(
            routes::USERS_REFRESH_TOKEN,
            get(auth::refresh_handler).post(auth::refresh_handler),
        )
        .route(routes::POST_USERS_LOGOUT, post(auth::logout_handler))
        .route(
            routes::USERS_PROFILE,
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_login,
        ))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
