//! HashiCorp Vault KV v2 secret store

use super::SecretStore;
use crate::config::VaultClientConfig;
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use tracing::debug;
use vaultrs::client::{VaultClient, VaultClientSettingsBuilder};
use vaultrs::error::ClientError;
use vaultrs::kv2;

pub struct VaultKvStore {
    client: VaultClient,
    mount: String,
}

impl VaultKvStore {
    pub fn new(client: VaultClient, mount: impl Into<String>) -> Self {
        Self {
            client,
            mount: mount.into(),
        }
    }

    /// Create from client config. Without an explicit token the client falls
    /// back to `VAULT_TOKEN`.
    pub fn from_config(config: &VaultClientConfig) -> Result<Self> {
        let mut settings = VaultClientSettingsBuilder::default();
        settings.address(&config.address);
        if let Some(token) = &config.token {
            settings.token(token);
        }

        let settings = settings
            .build()
            .map_err(|e| ConfigSourceError::Configuration(e.to_string()))?;

        let client = VaultClient::new(settings)
            .map_err(|e| ConfigSourceError::transport("Vault client", e))?;

        Ok(Self::new(client, config.mount_path.clone()))
    }
}

fn is_not_found(err: &ClientError) -> bool {
    matches!(err, ClientError::APIError { code: 404, .. })
}

#[async_trait]
impl SecretStore for VaultKvStore {
    async fn has_secrets_under(&self, prefix: &str) -> Result<bool> {
        match kv2::list(&self.client, &self.mount, prefix).await {
            Ok(keys) => Ok(!keys.is_empty()),
            Err(err) if is_not_found(&err) => Ok(false),
            Err(err) => Err(ConfigSourceError::transport("Vault list", err)),
        }
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        debug!(name, mount = %self.mount, "Getting secret from Vault");

        let data: serde_json::Value = match kv2::read(&self.client, &self.mount, name).await {
            Ok(data) => data,
            Err(err) if is_not_found(&err) => return Ok(None),
            Err(err) => return Err(ConfigSourceError::transport("Vault read", err)),
        };

        // The source decodes secret bodies as JSON text, same as Secrets Manager.
        Ok(Some(data.to_string()))
    }
}
