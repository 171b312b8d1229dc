//! Password hashing via bcrypt.

use std::sync::LazyLock;

use super::AuthError;

/// bcrypt cost factor.
pub const BCRYPT_COST: u32 = 10;

/// Hash checked when the account does not exist, so unknown emails cost the
/// same bcrypt work as wrong passwords.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("moon-unknown-account").ok());

/// Hash a password with bcrypt (cost 10).
///
/// Salting is handled by bcrypt; hashing the same password twice yields
/// different strings that both verify.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| AuthError::Hashing(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
///
/// A wrong password is `PasswordMismatch`; a stored hash bcrypt cannot parse
/// is `Hashing`.
pub fn verify_password(hash: &str, password: &str) -> Result<(), AuthError> {
    match bcrypt::verify(password, hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AuthError::PasswordMismatch),
        Err(e) => Err(AuthError::Hashing(format!("bcrypt verify: {e}"))),
    }
}

/// Run one verification against a fixed dummy hash and discard the result.
pub fn verify_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(hash, password);
    }
}
