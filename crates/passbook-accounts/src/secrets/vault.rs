//! HashiCorp Vault client (KV secrets engine v2).

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::{SecretsError, SecretsProvider};

/// Minimal Vault client: token auth read from a file, KV v2 reads over
/// HTTP. Built once at startup.
pub struct VaultClient {
    addr: String,
    token: String,
    mount: String,
    http: reqwest::Client,
}

impl VaultClient {
    pub fn new(
        addr: impl Into<String>,
        token: impl Into<String>,
        mount: impl Into<String>,
    ) -> Self {
        Self {
            addr: addr.into(),
            token: token.into(),
            mount: mount.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Build a client whose token is read from `token_file` (the usual
    /// agent-injected layout). An unreadable or empty file is a token
    /// error.
    pub fn from_token_file(
        addr: impl Into<String>,
        token_file: &Path,
        mount: impl Into<String>,
    ) -> Result<Self, SecretsError> {
        let token = std::fs::read_to_string(token_file)
            .map_err(|e| {
                SecretsError::Token(format!("cannot read {}: {}", token_file.display(), e))
            })?
            .trim()
            .to_string();
        if token.is_empty() {
            return Err(SecretsError::Token(format!(
                "token file {} is empty",
                token_file.display()
            )));
        }
        Ok(Self::new(addr, token, mount))
    }

    fn secret_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/data/{}",
            self.addr.trim_end_matches('/'),
            self.mount,
            path
        )
    }
}

#[async_trait]
impl SecretsProvider for VaultClient {
    async fn get_secret(&self, path: &str) -> Result<HashMap<String, String>, SecretsError> {
        let response = self
            .http
            .get(self.secret_url(path))
            .header("X-Vault-Token", self.token.as_str())
            .send()
            .await
            .map_err(|e| SecretsError::Connection(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(SecretsError::NotFound(path.to_string())),
            StatusCode::FORBIDDEN => return Err(SecretsError::Permission(path.to_string())),
            StatusCode::UNAUTHORIZED => {
                return Err(SecretsError::Authentication(
                    "invalid or expired token".to_string(),
                ));
            }
            status => {
                return Err(SecretsError::Connection(format!(
                    "unexpected status {status} for {path}"
                )));
            }
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SecretsError::Malformed(e.to_string()))?;
        parse_kv2(&body, path)
    }
}

/// Extract the `data.data` map of a KV v2 read response. Non-string values
/// are carried through as their JSON rendering.
fn parse_kv2(body: &Value, path: &str) -> Result<HashMap<String, String>, SecretsError> {
    let data = body
        .get("data")
        .and_then(|d| d.get("data"))
        .and_then(Value::as_object)
        .ok_or_else(|| SecretsError::Malformed(format!("no data.data object for {path}")))?;

    Ok(data
        .iter()
        .map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect())
}
