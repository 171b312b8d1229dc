//! # moon_core
//!
//! Core domain logic for Moon: password hashing, signed tokens, the session
//! registry and the account flows built on them.

pub mod auth;
pub mod cache;
pub mod models;
pub mod users;
pub mod validation;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
