//! Startup wiring: secrets, database, revocation store, and services.
//!
//! Everything is constructed once here and passed by reference afterwards;
//! there are no lazily initialised globals. Secret material comes from the
//! configured provider (Vault, or the environment in development) and is
//! fatal when missing.

use std::sync::Arc;

use tracing::info;

use passbook_core::config::Config;

use crate::auth::{Argon2PasswordHasher, TokenCodec};
use crate::clock::{Clock, SystemClock};
use crate::revocation::{
    InMemoryRevocationStore, RedisRevocationStore, RevocationError, RevocationStore,
};
use crate::secrets::{EnvSecretsProvider, SecretsError, SecretsProvider, VaultClient};
use crate::service::{AccountService, AuthService, UserService};
use crate::storage::{AccountsDatabase, DatabaseError};

/// Name of the signing-key secret, both in Vault and in the environment.
pub const JWT_SECRET_KEY: &str = "PASSBOOK_JWT_SECRET";

/// Secret material pulled at startup.
pub struct Secrets {
    pub jwt_secret: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("secrets error: {0}")]
    Secrets(#[from] SecretsError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("revocation store error: {0}")]
    Revocation(#[from] RevocationError),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Everything a transport layer needs to serve requests.
pub struct AppState {
    pub db: AccountsDatabase,
    pub accounts: AccountService,
}

/// Build the secrets provider the config selects: Vault when an address is
/// configured, environment variables otherwise.
pub fn secrets_provider(config: &Config) -> Result<Box<dyn SecretsProvider>, BootstrapError> {
    match (&config.vault.addr, &config.vault.token_file) {
        (Some(addr), Some(token_file)) => Ok(Box::new(VaultClient::from_token_file(
            addr.as_str(),
            token_file,
            config.vault.mount.as_str(),
        )?)),
        (Some(_), None) => Err(BootstrapError::Config(
            "vault.addr is set but vault.token_file is missing".to_string(),
        )),
        (None, _) => Ok(Box::new(EnvSecretsProvider)),
    }
}

/// Pull startup secrets. Called once, before any request is served.
pub async fn load_secrets(
    provider: &dyn SecretsProvider,
    config: &Config,
) -> Result<Secrets, BootstrapError> {
    let jwt_secret = provider
        .get_secret_key(&config.vault.secret_path, JWT_SECRET_KEY)
        .await?;

    info!("startup secrets loaded");
    Ok(Secrets { jwt_secret })
}

/// Assemble the service graph from config and secrets.
pub async fn build(config: &Config, secrets: &Secrets) -> Result<AppState, BootstrapError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let db = match &config.database.path {
        Some(path) => AccountsDatabase::open(path).await?,
        None => AccountsDatabase::open_in_memory().await?,
    };

    let revocation: Arc<dyn RevocationStore> = match &config.revocation.redis_url {
        Some(url) => Arc::new(RedisRevocationStore::connect(url).await?),
        None => Arc::new(InMemoryRevocationStore::new(Arc::clone(&clock))),
    };

    let codec = Arc::new(TokenCodec::new(
        secrets.jwt_secret.as_bytes(),
        config.auth.access_ttl_secs,
        config.auth.refresh_ttl_secs,
        Arc::clone(&clock),
    ));
    let auth = AuthService::new(codec, revocation, Arc::clone(&clock));
    let users = UserService::new(Arc::new(Argon2PasswordHasher), Arc::clone(&clock));
    let accounts = AccountService::new(db.clone(), users, auth);

    info!(
        file_db = config.database.path.is_some(),
        redis = config.revocation.redis_url.is_some(),
        "accounts service assembled"
    );

    Ok(AppState { db, accounts })
}
