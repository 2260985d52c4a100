//! Password hashing with Argon2id (PHC string format).

use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHash,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Stored hash is not a PHC string.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Hashes a password with a fresh random salt.
///
/// # Example
///
/// ```
/// use gestor_core::auth::hash_password;
///
/// let hash = hash_password("senhaForte42").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only malformed hashes and internal failures are errors.
///
/// ```
/// use gestor_core::auth::{hash_password, verify_password};
///
/// let hash = hash_password("senhaForte42").unwrap();
/// assert!(verify_password("senhaForte42", &hash).unwrap());
/// assert!(!verify_password("outraSenha1", &hash).unwrap());
/// ```
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash format is invalid.
/// Returns `PasswordError::VerifyError` if verification fails unexpectedly.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Hash checked when no account matches, so unknown and known logins cost the same.
static UNKNOWN_ACCOUNT_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("gestor-unknown-account").ok());

/// Runs a full verification against a fixed hash and always returns `false`.
///
/// Used on login when no account matches the identifier.
pub fn verify_password_without_account(password: &str) -> bool {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_phc_argon2id() {
        let hash = hash_password("senhaForte42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, "senhaForte42");
    }

    #[test]
    fn test_verify() {
        let hash = hash_password("correta123").unwrap();
        assert!(verify_password("correta123", &hash).unwrap());
        assert!(!verify_password("errada123", &hash).unwrap());
    }

    #[test]
    fn test_salt_makes_hashes_differ() {
        assert_ne!(
            hash_password("mesma123").unwrap(),
            hash_password("mesma123").unwrap()
        );
    }

    #[test]
    fn test_unknown_account_verification_never_matches() {
        assert!(!verify_password_without_account("gestor-unknown-account"));
        assert!(!verify_password_without_account("qualquer123"));
        assert!(UNKNOWN_ACCOUNT_HASH.as_deref().is_some_and(|h| h.starts_with("$argon2id$")));
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(matches!(
            verify_password("senha", "nao-e-um-hash"),
            Err(PasswordError::InvalidHash)
        ));
    }
}
