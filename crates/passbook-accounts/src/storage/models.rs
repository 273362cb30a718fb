//! Data models for accounts storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User identity record.
///
/// Mutated only through the explicit state-transition methods below; each
/// transition stamps `updated_at`. The password hash never serializes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Build a freshly registered user: active, unverified, never logged in.
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        username: Option<String>,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            username,
            password_hash,
            is_active: true,
            is_verified: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn activate(&mut self, now: DateTime<Utc>) {
        self.is_active = true;
        self.updated_at = now;
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    pub fn verify_email(&mut self, now: DateTime<Utc>) {
        self.is_verified = true;
        self.updated_at = now;
    }

    pub fn set_password_hash(&mut self, hash: String, now: DateTime<Utc>) {
        self.password_hash = hash;
        self.updated_at = now;
    }

    pub fn record_login(&mut self, now: DateTime<Utc>) {
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

/// One ledger row per issued refresh token.
///
/// `id` is the client-facing refresh handle; `jti` matches the id claim
/// inside the signed refresh token and keys the revocation blacklist. The
/// row is created at issuance, flipped to `revoked` on rotation or logout,
/// and never mutated otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RefreshToken {
    pub id: String,
    pub user_id: String,
    pub jti: String,
    pub fingerprint: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}
