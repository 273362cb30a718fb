//! JWT claims embedded in Passbook access and refresh tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token kind carried in the `token_type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw signed claims. Deserialization enforces claim presence: a token
/// missing any of these fields fails to decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID).
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
    /// Token kind: access or refresh.
    pub token_type: TokenType,
}

impl Claims {
    /// Normalize into a typed payload. `None` when the ids are not UUIDs or
    /// a timestamp is out of range.
    pub(crate) fn into_payload(self) -> Option<TokenPayload> {
        Some(TokenPayload {
            subject: Uuid::parse_str(&self.sub).ok()?,
            jti: Uuid::parse_str(&self.jti).ok()?,
            issued_at: DateTime::from_timestamp(self.iat, 0)?,
            expires_at: DateTime::from_timestamp(self.exp, 0)?,
            token_type: self.token_type,
        })
    }
}

/// Normalized payload of a successfully decoded token. Never persisted;
/// reconstructed on every validation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPayload {
    pub subject: Uuid,
    pub jti: Uuid,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_type: TokenType,
}
