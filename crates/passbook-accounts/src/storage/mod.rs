//! SQLite storage for the Passbook accounts service.
//!
//! [`AccountsDatabase`] owns the pool; every logical operation runs its
//! reads and writes through one [`UnitOfWork`] wrapping a single
//! transaction. Repository methods are split by entity across
//! `users.rs` and `refresh_tokens.rs`.

mod db;
mod models;
mod refresh_tokens;
mod users;

#[cfg(test)]
mod tests;

pub use db::{AccountsDatabase, DatabaseError, UnitOfWork};
pub use models::{RefreshToken, User};
