//! TTL-based revocation blacklist for token jtis.
//!
//! The blacklist answers one question on the hot path: has this jti been
//! revoked? Separating it from the refresh-token ledger keeps authenticated
//! requests off the relational store. Entries carry a TTL equal to the
//! remaining lifetime of the token they shadow and expire on their own;
//! nothing ever deletes them explicitly.

mod memory;
mod redis;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryRevocationStore;
pub use self::redis::RedisRevocationStore;

/// Blacklist backend failure. Expected outcomes (revoked or not) are never
/// errors; this surfaces only infrastructure trouble.
#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("revocation backend error: {0}")]
    Backend(String),
}

/// Existence-check store for revoked token ids.
///
/// Callers clamp `ttl` to at least one second so a marker always outlives
/// any residual validity window of the token being revoked.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Insert a marker for `jti` that disappears after `ttl` elapses.
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), RevocationError>;

    /// Whether `jti` currently has a live marker.
    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError>;
}
