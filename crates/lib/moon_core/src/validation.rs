//! Signup and profile input rules.

use std::sync::LazyLock;

use regex::Regex;

use crate::auth::AuthError;

/// Maximum nickname length (characters).
pub const MAX_NICKNAME_LEN: usize = 128;

/// Maximum about-me length (characters).
pub const MAX_ABOUT_ME_LEN: usize = 4096;

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Characters that count as "special" in a password.
const PASSWORD_SPECIALS: &str = "$@!%*#?&";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([-+.]\w+)*@\w+([-.]\w+)*\.\w+([-.]\w+)*$").expect("email regex compiles")
});

pub fn validate_email(email: &str) -> Result<(), AuthError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(AuthError::Validation("Invalid email format".into()))
    }
}

/// At least 8 characters from letters, digits and `$@!%*#?&`, with one of
/// each class present.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);
    let allowed = password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || is_special(c));
    let ok = allowed
        && password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special);
    if ok {
        Ok(())
    } else {
        Err(AuthError::Validation(
            "Password must be at least 8 characters and contain a letter, a digit and a special character".into(),
        ))
    }
}

pub fn validate_nickname(nickname: &str) -> Result<(), AuthError> {
    let len = nickname.trim().chars().count();
    if len == 0 || len > MAX_NICKNAME_LEN {
        return Err(AuthError::Validation(format!(
            "Nickname must be 1-{MAX_NICKNAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_about_me(about_me: &str) -> Result<(), AuthError> {
    if about_me.chars().count() > MAX_ABOUT_ME_LEN {
        return Err(AuthError::Validation(format!(
            "About me must be at most {MAX_ABOUT_ME_LEN} characters"
        )));
    }
    Ok(())
}

/// Full signup check, including the confirmation field.
pub fn validate_signup(
    email: &str,
    password: &str,
    confirm_password: &str,
    nickname: &str,
) -> Result<(), AuthError> {
    validate_email(email)?;
    if password != confirm_password {
        return Err(AuthError::Validation("Passwords do not match".into()));
    }
    validate_password(password)?;
    validate_nickname(nickname)
}
