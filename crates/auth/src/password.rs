//! Password hashing capability (Argon2id, PHC string format).

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password cannot be empty")]
    Empty,

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

pub trait PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordError>;
}

/// `verify(password, hash) -> bool`. A hash that cannot be parsed never matches.
pub trait PasswordVerifier {
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Clone, Default)]
pub struct Argon2Passwords {
    argon2: Argon2<'static>,
}

impl core::fmt::Debug for Argon2Passwords {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Argon2Passwords")
    }
}

impl Argon2Passwords {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2Passwords {
    fn hash(&self, password: &str) -> Result<String, PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::Hashing(e.to_string()))
    }
}

impl PasswordVerifier for Argon2Passwords {
    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            tracing::warn!("stored password hash is not a valid PHC string");
            return false;
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
