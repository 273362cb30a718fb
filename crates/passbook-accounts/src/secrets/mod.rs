//! Secrets retrieval for startup configuration.
//!
//! Consumed once by bootstrap to pull signing-key material; never on the
//! request path. A missing secret is fatal at startup, not at request time.

mod vault;

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

pub use vault::VaultClient;

#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("secrets backend connection failed: {0}")]
    Connection(String),

    #[error("secrets backend authentication failed: {0}")]
    Authentication(String),

    #[error("permission denied for secret path {0}")]
    Permission(String),

    #[error("secret not found at {0}")]
    NotFound(String),

    #[error("secret at {path} has no key {key}")]
    MissingKey { path: String, key: String },

    #[error("secrets token error: {0}")]
    Token(String),

    #[error("malformed secret payload: {0}")]
    Malformed(String),
}

/// Key/value secrets source.
#[async_trait]
pub trait SecretsProvider: Send + Sync {
    /// Fetch every key stored under `path`.
    async fn get_secret(&self, path: &str) -> Result<HashMap<String, String>, SecretsError>;

    /// Fetch a single key stored under `path`.
    async fn get_secret_key(&self, path: &str, key: &str) -> Result<String, SecretsError> {
        let mut values = self.get_secret(path).await?;
        values.remove(key).ok_or_else(|| SecretsError::MissingKey {
            path: path.to_string(),
            key: key.to_string(),
        })
    }
}

/// Reads secrets from process environment variables, ignoring the path.
/// Development and test stand-in for Vault.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecretsProvider;

#[async_trait]
impl SecretsProvider for EnvSecretsProvider {
    async fn get_secret(&self, _path: &str) -> Result<HashMap<String, String>, SecretsError> {
        Ok(std::env::vars().collect())
    }

    async fn get_secret_key(&self, path: &str, key: &str) -> Result<String, SecretsError> {
        std::env::var(key).map_err(|_| SecretsError::MissingKey {
            path: path.to_string(),
            key: key.to_string(),
        })
    }
}
