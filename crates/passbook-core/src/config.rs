//! Configuration for the Passbook accounts service.
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. Config file (JSON), when a path is supplied
//! 3. Environment variables (highest priority)
//!
//! The resulting [`Config`] is constructed once at process start and passed
//! by reference to constructors; there is no global configuration state.
//! Secret material (signing key, store credentials) is never part of this
//! file-backed config; it is pulled through the secrets provider at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Passbook accounts configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub revocation: RevocationConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Token lifetime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access token lifetime (seconds).
    pub access_ttl_secs: i64,
    /// Refresh token lifetime (seconds).
    pub refresh_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 15 * 24 * 60 * 60, // 15 days
        }
    }
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file. `None` selects an in-memory
    /// database (development and tests).
    pub path: Option<PathBuf>,
}

/// Revocation blacklist backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RevocationConfig {
    /// Redis connection URL. `None` selects the process-local in-memory
    /// store, which is only correct for single-instance deployments.
    pub redis_url: Option<String>,
}

/// Secrets provider (HashiCorp Vault) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Vault server address, e.g. `http://localhost:8200`. `None` selects
    /// the environment-variable secrets provider.
    pub addr: Option<String>,
    /// File containing the Vault authentication token.
    pub token_file: Option<PathBuf>,
    /// KV v2 mount point.
    pub mount: String,
    /// Path of the secret holding this service's startup material.
    pub secret_path: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            addr: None,
            token_file: None,
            mount: "secret".to_string(),
            secret_path: "passbook/accounts".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default tracing filter when `RUST_LOG` is not set.
    pub level: String,
    /// Emit structured JSON log lines.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "passbook_accounts=info".to_string(),
            json: false,
        }
    }
}

/// Load configuration: defaults, then the given file (if any), then
/// environment overrides.
pub fn load_config(file: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(path) = file {
        let overlay = load_config_file(path)?;
        merge_config(&mut config, overlay);
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.auth = overlay.auth;

    if overlay.database.path.is_some() {
        base.database.path = overlay.database.path;
    }
    if overlay.revocation.redis_url.is_some() {
        base.revocation.redis_url = overlay.revocation.redis_url;
    }

    if overlay.vault.addr.is_some() {
        base.vault.addr = overlay.vault.addr;
    }
    if overlay.vault.token_file.is_some() {
        base.vault.token_file = overlay.vault.token_file;
    }
    base.vault.mount = overlay.vault.mount;
    base.vault.secret_path = overlay.vault.secret_path;

    base.log = overlay.log;
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("PASSBOOK_ACCESS_TTL_SECS") {
        if let Ok(n) = val.parse() {
            config.auth.access_ttl_secs = n;
        }
    }
    if let Ok(val) = std::env::var("PASSBOOK_REFRESH_TTL_SECS") {
        if let Ok(n) = val.parse() {
            config.auth.refresh_ttl_secs = n;
        }
    }
    if let Ok(val) = std::env::var("PASSBOOK_DATABASE_PATH") {
        config.database.path = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("PASSBOOK_REDIS_URL") {
        config.revocation.redis_url = Some(val);
    }
    if let Ok(val) = std::env::var("PASSBOOK_VAULT_ADDR") {
        config.vault.addr = Some(val);
    }
    if let Ok(val) = std::env::var("PASSBOOK_VAULT_TOKEN_FILE") {
        config.vault.token_file = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("PASSBOOK_LOG_LEVEL") {
        config.log.level = val;
    }
}
