//! Password hashing and verification using argon2id.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};

/// Opaque hashing failure (malformed hash, backend error). A wrong password
/// is not an error; `verify` reports it as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
#[error("password hash error: {0}")]
pub struct PasswordHashError(String);

impl From<argon2::password_hash::Error> for PasswordHashError {
    fn from(e: argon2::password_hash::Error) -> Self {
        Self(e.to_string())
    }
}

/// One-way password hashing capability.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

/// Argon2id with a random salt per hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordHasher;

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed_hash = PasswordHash::new(hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
