//! Authentication primitives for the Passbook accounts service.
//!
//! JWT codec and claims, password hashing, and client fingerprinting.

pub mod claims;
pub mod codec;
pub mod fingerprint;
pub mod password;

pub use claims::{Claims, TokenPayload, TokenType};
pub use codec::TokenCodec;
pub use password::{Argon2PasswordHasher, PasswordHasher};
