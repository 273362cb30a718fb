//! Process-local blacklist backed by a concurrent map.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::{RevocationError, RevocationStore};
use crate::clock::Clock;

/// In-memory revocation store for single-instance deployments and tests.
///
/// Entries record their absolute expiry; stale ones are dropped lazily on
/// read and swept on each write, so the map never outgrows the set of
/// tokens that are still worth blocking.
pub struct InMemoryRevocationStore {
    entries: DashMap<String, DateTime<Utc>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRevocationStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    fn sweep(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, expires_at| *expires_at > now);
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, jti: &str, ttl: Duration) -> Result<(), RevocationError> {
        let now = self.clock.now();
        self.sweep(now);

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| RevocationError::Backend(e.to_string()))?;
        self.entries.insert(jti.to_string(), now + ttl);
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        let now = self.clock.now();
        let expired = match self.entries.get(jti) {
            None => return Ok(false),
            Some(entry) => *entry.value() <= now,
        };
        if expired {
            self.entries.remove(jti);
            return Ok(false);
        }
        Ok(true)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store() -> (InMemoryRevocationStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (
            InMemoryRevocationStore::new(Arc::clone(&clock) as Arc<dyn Clock>),
            clock,
        )
    }

    #[tokio::test]
    async fn revoked_jti_is_reported() {
        let (store, _clock) = store();
        store
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();

        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn marker_expires_with_its_ttl() {
        let (store, clock) = store();
        store
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(59));
        assert!(store.is_revoked("jti-1").await.unwrap());

        clock.advance(chrono::Duration::seconds(2));
        assert!(!store.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn writes_sweep_expired_markers() {
        let (store, clock) = store();
        store
            .revoke("old", Duration::from_secs(10))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(11));
        store
            .revoke("new", Duration::from_secs(10))
            .await
            .unwrap();

        assert_eq!(store.entries.len(), 1);
        assert!(store.is_revoked("new").await.unwrap());
    }

    #[tokio::test]
    async fn re_revoking_extends_the_marker() {
        let (store, clock) = store();
        store.revoke("jti-1", Duration::from_secs(5)).await.unwrap();
        store
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(30));
        assert!(store.is_revoked("jti-1").await.unwrap());
    }
}
