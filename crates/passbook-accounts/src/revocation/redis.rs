//! Redis-backed blacklist for multi-instance deployments.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{RevocationError, RevocationStore};

/// Shared revocation store: `SET revoked:{jti} 1 EX <ttl>` on revoke,
/// `EXISTS` on check. Keys expire server-side with the token they shadow.
#[derive(Clone)]
pub struct RedisRevocationStore {
    conn: ConnectionManager,
}

impl RedisRevocationStore {
    /// Connect to `url` and build a shared connection manager.
    pub async fn connect(url: &str) -> Result<Self, RevocationError> {
        let client =
            redis::Client::open(url).map_err(|e| RevocationError::Backend(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| RevocationError::Backend(e.to_string()))?;
        Ok(Self { conn })
    }

    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(jti: &str) -> String {
        format!("revoked:{jti}")
    }
}

#[async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), RevocationError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(Self::key(jti))
            .arg("1")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| RevocationError::Backend(e.to_string()))
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        let mut conn = self.conn.clone();
        let exists: bool = redis::cmd("EXISTS")
            .arg(Self::key(jti))
            .query_async(&mut conn)
            .await
            .map_err(|e| RevocationError::Backend(e.to_string()))?;
        Ok(exists)
    }
}
