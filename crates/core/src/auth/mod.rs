//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification
//! - Password strength rules

mod password;

pub use password::{PasswordError, hash_password, verify_password, verify_password_without_account};

use crate::validation::FieldErrors;

/// Minimum password length accepted for colaboradores.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Checks the password policy: minimum length, at least one letter and one digit.
pub fn validate_password_strength(field: &str, password: &str, errors: &mut FieldErrors) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            field,
            format!("deve ter no minimo {MIN_PASSWORD_LEN} caracteres"),
        );
        return;
    }

    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        errors.add(field, "deve conter letras e numeros");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_strength() {
        let mut errors = FieldErrors::new();
        validate_password_strength("senha", "abc123", &mut errors);
        assert!(errors.contains("senha"));

        let mut errors = FieldErrors::new();
        validate_password_strength("senha", "somenteletras", &mut errors);
        assert!(errors.contains("senha"));

        let mut errors = FieldErrors::new();
        validate_password_strength("senha", "senhaForte42", &mut errors);
        assert!(errors.is_empty());
    }
}
