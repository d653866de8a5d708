//! One-way password derivation and verification.
//!
//! The stored credential is an opaque PHC string; plaintext never leaves this
//! module's function boundaries.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use thiserror::Error;

use lodge_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password derivation failed: {0}")]
    Derivation(String),
}

impl From<PasswordError> for DomainError {
    fn from(e: PasswordError) -> Self {
        DomainError::Validation(e.to_string())
    }
}

/// Derive the stored credential from a plaintext password.
pub fn derive_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Derivation(e.to_string()))?
        .to_string();
    Ok(hash)
}

/// Verify a plaintext password against a stored credential.
///
/// Any malformed stored value verifies as false rather than erroring; the
/// caller cannot distinguish "bad hash" from "wrong password".
pub fn verify_password(plaintext: &str, derived: &str) -> bool {
    match PasswordHash::new(derived) {
        Ok(parsed) => Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_credential_verifies_only_the_original() {
        let hash = derive_password("s3cret").unwrap();
        assert_ne!(hash, "s3cret");
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("other", &hash));
    }

    #[test]
    fn derivation_is_salted() {
        let a = derive_password("same").unwrap();
        let b = derive_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_stored_value_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }
}
