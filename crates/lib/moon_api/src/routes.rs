//! Route paths.

pub const GET_HEALTH: &str = "/health";
pub const POST_USERS_SIGNUP: &str = "/users/signup";
pub const POST_USERS_LOGIN: &str = "/users/login";
pub const POST_USERS_LOGOUT: &str = "/users/logout";
/// Served for both `GET` and `POST`.
pub const USERS_REFRESH_TOKEN: &str = "/users/refresh_token";
pub const USERS_PROFILE: &str = "/users/profile";

/// Paths reachable without an access token. Everything else goes through
/// the login gate.
pub const PUBLIC_PATHS: &[&str] = &[
    GET_HEALTH,
    POST_USERS_SIGNUP,
    POST_USERS_LOGIN,
    USERS_REFRESH_TOKEN,
];

/// Response header carrying a freshly minted access token.
pub const ACCESS_TOKEN_HEADER: &str = "x-jwt-token";

/// Response header carrying a freshly minted refresh token.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";
