//! Login gate: Bearer token extraction, JWT verification and session
//! liveness check for every non-public route.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use moon_core::auth::AuthError;
use moon_core::models::auth::Identity;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::AppError;
use crate::routes::PUBLIC_PATHS;

/// Key used to store the caller's `Identity` in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Whether a request may skip the gate.
pub fn is_public(method: &Method, path: &str) -> bool {
    *method == Method::OPTIONS || PUBLIC_PATHS.iter().any(|p| *p == path)
}

/// Token from an `Authorization: Bearer <token>` header, if present. The
/// scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Axum middleware: extracts the access token, verifies it, checks that its
/// session is still live and injects `AuthenticatedUser` into request
/// extensions.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public(request.method(), request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let token = bearer_token(request.headers())
        .ok_or_else(|| {
            debug!(path = %request.uri().path(), "login gate: no bearer token");
            AppError::unauthorized()
        })?
        .to_string();

    let identity = state.auth.authenticate(&token).await.map_err(|e| match e {
        AuthError::TokenExpired => {
            debug!("login gate: access token expired");
            AppError::TokenExpired
        }
        AuthError::StoreUnavailable(msg) => {
            warn!("login gate: session check failed: {msg}");
            AppError::unauthorized()
        }
        other => {
            debug!("login gate: rejected: {other}");
            AppError::unauthorized()
        }
    })?;

    request.extensions_mut().insert(AuthenticatedUser(identity));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token(&headers("bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("BEARER abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("Bearerabc.def.ghi")), None);
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("abc.def.ghi")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn allow_list_is_explicit() {
        assert!(is_public(&Method::POST, "/users/login"));
        assert!(is_public(&Method::POST, "/users/signup"));
        assert!(is_public(&Method::POST, "/users/refresh_token"));
        assert!(is_public(&Method::GET, "/health"));
        assert!(is_public(&Method::OPTIONS, "/users/profile"));
        assert!(!is_public(&Method::POST, "/users/logout"));
        assert!(!is_public(&Method::GET, "/users/profile"));
        assert!(!is_public(&Method::GET, "/users/login/extra"));
    }
}
