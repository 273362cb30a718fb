//! JWT token issuance and validation.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use super::claims::{Claims, TokenPayload, TokenType};
use crate::clock::Clock;

/// Signs and verifies the access/refresh token pair.
///
/// Tokens are self-contained: validating one takes a single signature check
/// and no store round-trip. Revocation is layered on top by the auth
/// service, which only needs the jti from the decoded payload.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec signing with `secret`. Lifetimes are independently
    /// configurable; expiry of issued tokens is `clock.now()` plus the
    /// matching lifetime.
    pub fn new(
        secret: &[u8],
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // Zero leeway: a revoked token's blacklist marker carries a
        // one-second minimum TTL, which must cover any residual window in
        // which the token still decodes.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::seconds(access_ttl_secs),
            refresh_ttl: Duration::seconds(refresh_ttl_secs),
            clock,
        }
    }

    /// Create a signed access/refresh pair for `subject`. Each token gets a
    /// fresh random jti, so the two ids never collide.
    pub fn create_pair(
        &self,
        subject: &str,
    ) -> Result<(String, String), jsonwebtoken::errors::Error> {
        let now = self.clock.now().timestamp();

        let access = Claims {
            jti: Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            iat: now,
            exp: now + self.access_ttl.num_seconds(),
            token_type: TokenType::Access,
        };
        let refresh = Claims {
            jti: Uuid::new_v4().to_string(),
            sub: subject.to_string(),
            iat: now,
            exp: now + self.refresh_ttl.num_seconds(),
            token_type: TokenType::Refresh,
        };

        let header = Header::default();
        let access_token = jsonwebtoken::encode(&header, &access, &self.encoding_key)?;
        let refresh_token = jsonwebtoken::encode(&header, &refresh, &self.encoding_key)?;
        Ok((access_token, refresh_token))
    }

    /// Decode and validate a token. `None` on any failure: bad signature,
    /// expiry, a missing claim, non-UUID ids, or a `token_type` claim not
    /// matching `expected`. Expiry is enforced by the signature library
    /// with no leeway.
    pub fn decode(&self, token: &str, expected: TokenType) -> Option<TokenPayload> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation).ok()?;
        let payload = data.claims.into_payload()?;
        (payload.token_type == expected).then_some(payload)
    }

    /// Configured access token lifetime.
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime.
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}
