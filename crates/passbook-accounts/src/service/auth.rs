//! Auth service: the state machine over a token pair's lifecycle.
//!
//! A refresh token moves `ISSUED -> ROTATED` (replaced by a new pair),
//! `ISSUED -> REVOKED` (logout), or `ISSUED -> EXPIRED` (passive, detected
//! at validation). All three end states are terminal. Rotation and logout
//! write both the blacklist and the ledger; expiry mutates nothing.
//!
//! The client-facing refresh handle is the ledger row id, not the signed
//! refresh JWT: revocation then works by id without re-decoding a token,
//! and the signed refresh token is never transmitted after issuance.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::{TokenCodec, TokenPayload, TokenType};
use crate::clock::Clock;
use crate::revocation::{RevocationError, RevocationStore};
use crate::storage::{DatabaseError, RefreshToken, UnitOfWork};

/// Issued pair handed back to the boundary layer.
///
/// `refresh_token` carries the ledger row id (the refresh handle), not the
/// signed refresh JWT.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("revocation store error: {0}")]
    Revocation(#[from] RevocationError),

    #[error("token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    /// A token this service just minted failed to decode. That contradicts
    /// the codec's own contract, so it is a hard error rather than a
    /// rejection.
    #[error("freshly minted {0} token failed to decode")]
    MintedTokenInvalid(&'static str),
}

/// Orchestrates the token codec, revocation blacklist, and refresh-token
/// ledger. Expected rejections (bad, expired, or revoked input) come back
/// as `None`/`false`; `Err` is reserved for infrastructure failures.
pub struct AuthService {
    codec: Arc<TokenCodec>,
    revocation: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        codec: Arc<TokenCodec>,
        revocation: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            revocation,
            clock,
        }
    }

    /// Mint an access/refresh pair for `user_id` and record the refresh
    /// side in the ledger within the caller's transaction.
    #[instrument(skip(self, uow, fingerprint))]
    pub async fn create_token_pair(
        &self,
        uow: &mut UnitOfWork,
        user_id: &str,
        fingerprint: &str,
    ) -> Result<TokenPair, AuthError> {
        let (access_token, refresh_token) = self.codec.create_pair(user_id)?;

        let access = self
            .codec
            .decode(&access_token, TokenType::Access)
            .ok_or(AuthError::MintedTokenInvalid("access"))?;
        let refresh = self
            .codec
            .decode(&refresh_token, TokenType::Refresh)
            .ok_or(AuthError::MintedTokenInvalid("refresh"))?;

        let row = RefreshToken {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            jti: refresh.jti.to_string(),
            fingerprint: fingerprint.to_string(),
            created_at: self.clock.now(),
            expires_at: refresh.expires_at,
            revoked: false,
        };
        uow.add_refresh_token(&row).await?;

        info!(user_id, refresh_id = %row.id, "token pair issued");

        Ok(TokenPair {
            access_token,
            refresh_token: row.id,
            access_expires_at: access.expires_at,
            refresh_expires_at: refresh.expires_at,
        })
    }

    /// Validate an access token: one signature verify plus one blacklist
    /// lookup. Expired or malformed tokens never reach the blacklist. No
    /// store mutation.
    pub async fn validate_access_token(
        &self,
        token: &str,
    ) -> Result<Option<TokenPayload>, AuthError> {
        let Some(payload) = self.codec.decode(token, TokenType::Access) else {
            return Ok(None);
        };
        if self.revocation.is_revoked(&payload.jti.to_string()).await? {
            return Ok(None);
        }
        Ok(Some(payload))
    }

    /// Exchange a refresh handle for a new pair.
    ///
    /// Single use: the ledger row is claimed with a conditional update
    /// before anything is minted, so of two concurrent callers presenting
    /// the same handle exactly one wins; the loser gets `None`. A rejection
    /// leaves the old token exactly as it was.
    #[instrument(skip_all)]
    pub async fn refresh_token_pair(
        &self,
        uow: &mut UnitOfWork,
        handle: &str,
    ) -> Result<Option<TokenPair>, AuthError> {
        if Uuid::parse_str(handle).is_err() {
            return Ok(None);
        }
        let Some(row) = uow.get_refresh_token(handle).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        if row.revoked || row.expires_at <= now {
            return Ok(None);
        }
        if self.revocation.is_revoked(&row.jti).await? {
            return Ok(None);
        }

        // Atomic single-use claim; the loser of a concurrent rotation race
        // (or a handle revoked by logout in the meantime) stops here.
        if !uow.revoke_refresh_token(&row.id).await? {
            warn!(refresh_id = %row.id, "refresh handle lost rotation race");
            return Ok(None);
        }

        self.revocation
            .revoke(&row.jti, remaining_ttl(row.expires_at, now))
            .await?;

        info!(user_id = %row.user_id, refresh_id = %row.id, "refresh token rotated");

        self.create_token_pair(uow, &row.user_id, &row.fingerprint)
            .await
            .map(Some)
    }

    /// Revoke both tokens of a pair (logout). Reports rather than raises:
    /// if either input is invalid, returns `false` with no mutation.
    /// Revoking an already-revoked pair again is a no-op that still
    /// returns `true`.
    #[instrument(skip_all)]
    pub async fn revoke_token_pair(
        &self,
        uow: &mut UnitOfWork,
        access_token: &str,
        handle: &str,
    ) -> Result<bool, AuthError> {
        let Some(access) = self.codec.decode(access_token, TokenType::Access) else {
            return Ok(false);
        };
        if Uuid::parse_str(handle).is_err() {
            return Ok(false);
        }
        let Some(row) = uow.get_refresh_token(handle).await? else {
            return Ok(false);
        };

        let now = self.clock.now();
        self.revocation
            .revoke(&access.jti.to_string(), remaining_ttl(access.expires_at, now))
            .await?;
        self.revocation
            .revoke(&row.jti, remaining_ttl(row.expires_at, now))
            .await?;
        uow.revoke_refresh_token(&row.id).await?;

        info!(user_id = %row.user_id, refresh_id = %row.id, "token pair revoked");
        Ok(true)
    }
}

/// Remaining lifetime as a blacklist TTL, clamped to at least one second so
/// the marker always outlives any residual validity window.
fn remaining_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> StdDuration {
    (expires_at - now)
        .to_std()
        .map_or(StdDuration::from_secs(1), |d| {
            d.max(StdDuration::from_secs(1))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_ttl_clamps_to_one_second() {
        let now = Utc::now();
        assert_eq!(
            remaining_ttl(now - chrono::Duration::minutes(5), now),
            StdDuration::from_secs(1)
        );
        assert_eq!(remaining_ttl(now, now), StdDuration::from_secs(1));
    }

    #[test]
    fn remaining_ttl_tracks_the_token() {
        let now = Utc::now();
        assert_eq!(
            remaining_ttl(now + chrono::Duration::seconds(90), now),
            StdDuration::from_secs(90)
        );
    }
}
