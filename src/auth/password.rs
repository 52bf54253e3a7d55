//! Password hashing (Argon2id) and the password strength policy.

use crate::errors::{Error, FieldErrors, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

const COMMON_PASSWORDS: &[&str] = &[
    "password", "password1", "password123", "12345678", "123456789", "1234567890",
    "qwertyuiop", "azertyuiop", "iloveyou", "sunshine", "football", "baseball",
    "letmein1", "welcome1", "admin123", "motdepasse", "abc12345", "trustno1",
    "princess", "dragon12", "passw0rd", "superman", "whatever", "11111111",
];

/// Hashes a password into an Argon2id PHC string.
///
/// # Errors
/// Returns [`Error::Crypto`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Crypto(format!("password hashing failed: {e}")))
}

/// Verifies a password against a stored PHC string.
///
/// Returns `Ok(false)` on mismatch and an error only for a malformed hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| Error::Crypto(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(Error::Crypto(format!("verify error: {e}"))),
    }
}

/// Checks a password against the strength policy.
///
/// `attributes` are the user's own identifying values (username, email,
/// names); a password containing one of them, or contained in one, is
/// rejected. All failed rules are reported together under `password`.
pub fn check_password_strength(password: &str, attributes: &[&str]) -> Result<()> {
    let mut messages = Vec::new();
    let lowered = password.to_lowercase();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        messages.push(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        messages.push("This password is entirely numeric.".to_string());
    }
    if COMMON_PASSWORDS.contains(&lowered.as_str()) {
        messages.push("This password is too common.".to_string());
    }
    let similar = attributes
        .iter()
        .map(|a| a.split('@').next().unwrap_or_default().trim().to_lowercase())
        .filter(|a| a.chars().count() >= 3)
        .any(|a| lowered.contains(&a) || (lowered.len() >= 3 && a.contains(&lowered)));
    if similar {
        messages.push("The password is too similar to the account details.".to_string());
    }

    if messages.is_empty() {
        Ok(())
    } else {
        let mut errors = FieldErrors::new();
        errors.insert("password".to_string(), messages);
        Err(Error::Validation { errors })
    }
}

/// Checks that both password entries match and that the password is strong
/// enough. Nothing is hashed or stored here.
pub fn check_password_pair(password: &str, confirmation: &str, attributes: &[&str]) -> Result<()> {
    if password != confirmation {
        return Err(Error::invalid("password", "Passwords do not match."));
    }
    check_password_strength(password, attributes)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn password_messages(result: Result<()>) -> Vec<String> {
        match result {
            Err(Error::Validation { errors }) => errors.get("password").cloned().unwrap_or_default(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Correct-Horse-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Correct-Horse-42", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("pw", "not-a-hash").is_err());
    }

    #[test]
    fn test_strong_password_accepted() {
        assert!(check_password_pair("Tamarind-Sky-19", "Tamarind-Sky-19", &["alice"]).is_ok());
    }

    #[test]
    fn test_mismatch_rejected() {
        let messages = password_messages(check_password_pair("Tamarind-Sky-19", "Tamarind-Sky-20", &[]));
        assert_eq!(messages, vec!["Passwords do not match.".to_string()]);
    }

    #[test]
    fn test_short_and_numeric_rejected() {
        let messages = password_messages(check_password_strength("1234", &[]));
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_common_password_rejected() {
        let messages = password_messages(check_password_strength("Password123", &[]));
        assert!(messages.iter().any(|m| m.contains("too common")));
    }

    #[test]
    fn test_similar_to_username_rejected() {
        let messages =
            password_messages(check_password_strength("kouassi2025!", &["kouassi", "k@x.ci"]));
        assert!(messages.iter().any(|m| m.contains("too similar")));
    }
}
