//! Signup, login, token refresh and logout handlers.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use moon_core::validation;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthenticatedUser, bearer_token};
use crate::models::{
    AccessTokenResponse, LoginRequest, LogoutResponse, SignupRequest, SignupResponse,
    TokenResponse,
};
use crate::routes::{ACCESS_TOKEN_HEADER, REFRESH_TOKEN_HEADER};

fn token_header(headers: &mut HeaderMap, name: &'static str, token: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(token)
        .map_err(|e| AppError::Internal(format!("token header: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// `POST /users/signup`: create a new account.
pub async fn signup_handler(
    State(state): State<AppState>,
    Json(body): Json<SignupRequest>,
) -> AppResult<Json<SignupResponse>> {
    validation::validate_signup(
        &body.email,
        &body.password,
        &body.confirm_password,
        &body.nickname,
    )?;
    state
        .auth
        .signup(&body.email, &body.password, body.nickname.trim())
        .await?;
    Ok(Json(SignupResponse { success: true }))
}

/// `POST /users/login`: authenticate with email + password.
///
/// Tokens are returned in the body and mirrored in the `x-jwt-token` and
/// `x-refresh-token` headers.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<(HeaderMap, Json<TokenResponse>)> {
    debug!(request = ?body, "login attempt");
    let pair = state.auth.login(&body.email, &body.password).await?;

    let mut headers = HeaderMap::new();
    token_header(&mut headers, ACCESS_TOKEN_HEADER, &pair.access_token)?;
    token_header(&mut headers, REFRESH_TOKEN_HEADER, &pair.refresh_token)?;

    Ok((
        headers,
        Json(TokenResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: state.auth.tokens().access_ttl_secs(),
            token_type: "Bearer".to_string(),
        }),
    ))
}

/// `GET`/`POST /users/refresh_token`: exchange the refresh token carried in
/// `Authorization: Bearer` for a new access token on the same session.
pub async fn refresh_handler(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> AppResult<(HeaderMap, Json<AccessTokenResponse>)> {
    let refresh_token = bearer_token(&request_headers).ok_or_else(AppError::unauthorized)?;
    let access_token = state.auth.refresh(refresh_token).await?;

    let mut headers = HeaderMap::new();
    token_header(&mut headers, ACCESS_TOKEN_HEADER, &access_token)?;

    Ok((
        headers,
        Json(AccessTokenResponse {
            access_token,
            expires_in: state.auth.tokens().access_ttl_secs(),
            token_type: "Bearer".to_string(),
        }),
    ))
}

/// `POST /users/logout`: revoke the caller's session. Requires authentication.
pub async fn logout_handler(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> AppResult<Json<LogoutResponse>> {
    state.auth.logout(&user.0.session_id).await?;
    Ok(Json(LogoutResponse { success: true }))
}
