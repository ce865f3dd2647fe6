//! One secret per section, holding a JSON object of key/value pairs

use crate::backends::{SecretStore, SecretsManagerStore, VaultKvStore};
use crate::cache::FetchCache;
use crate::config::{AwsClientConfig, SecretBlobConfig, VaultClientConfig};
use crate::key::normalize;
use crate::resolver::KeyResolver;
use crate::{ConfigSource, ConfigSourceError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

type SectionFields = Arc<HashMap<String, String>>;

/// Reads secret `prefix/section` once per section and resolves keys from its
/// decoded body.
pub struct SecretBlobSource {
    name: String,
    store: Arc<dyn SecretStore>,
    prefix: String,
    resolver: KeyResolver,
    sections: FetchCache<SectionFields>,
}

impl SecretBlobSource {
    pub async fn new(store: Arc<dyn SecretStore>, config: SecretBlobConfig) -> Result<Self> {
        config.validate()?;
        let resolver = KeyResolver::from_options(&config.options);
        let prefix = config.prefix.trim_end_matches('/').to_string();

        if resolver.must_exist() && !store.has_secrets_under(&prefix).await? {
            return Err(ConfigSourceError::LocatorUnavailable {
                locator: format!("{prefix}/*"),
            });
        }

        info!(%prefix, "Initialized secret configuration source");

        Ok(Self {
            name: "secrets".to_string(),
            store,
            prefix,
            resolver,
            sections: FetchCache::new(),
        })
    }

    /// Create against AWS Secrets Manager.
    pub async fn from_aws(config: SecretBlobConfig, client: &AwsClientConfig) -> Result<Self> {
        config.validate()?;
        let store = SecretsManagerStore::from_config(client).await;
        Ok(Self::new(Arc::new(store), config)
            .await?
            .with_name("secrets-manager"))
    }

    /// Create against a Vault KV v2 mount.
    pub async fn from_vault(config: SecretBlobConfig, client: &VaultClientConfig) -> Result<Self> {
        config.validate()?;
        let store = VaultKvStore::from_config(client)?;
        Ok(Self::new(Arc::new(store), config).await?.with_name("vault"))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn secret_name(&self, section: &str) -> String {
        format!("{}/{}", self.prefix, section)
    }

    /// Number of sections whose secret has been fetched (present or absent).
    pub fn cached_sections(&self) -> usize {
        self.sections.len()
    }

    async fn fetch_section(&self, secret_name: &str) -> Result<Option<SectionFields>> {
        debug!(secret = secret_name, "Fetching section secret");
        match self.store.get_secret(secret_name).await? {
            Some(body) => Ok(Some(Arc::new(decode_fields(secret_name, &body)?))),
            None => Ok(None),
        }
    }
}

/// Decodes a secret body into lowercased keys and string values. Scalars
/// keep their JSON text, `null` counts as absent.
pub fn decode_fields(secret_name: &str, body: &str) -> Result<HashMap<String, String>> {
    let object: serde_json::Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| ConfigSourceError::malformed(secret_name, e))?;

    let mut fields = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let value = match value {
            Value::Null => continue,
            Value::String(text) => text,
            Value::Bool(flag) => flag.to_string(),
            Value::Number(number) => number.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(ConfigSourceError::malformed(
                    secret_name,
                    format!("value of {key} is not a scalar"),
                ));
            }
        };
        fields.insert(normalize(&key), value);
    }

    Ok(fields)
}

#[async_trait]
impl ConfigSource for SecretBlobSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_config_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        self.resolver
            .resolve(section, key, |key| async move {
                let secret_name = self.secret_name(key.section());
                let fields = self
                    .sections
                    .get_or_fetch(&secret_name, || self.fetch_section(&secret_name))
                    .await?;
                Ok(fields.and_then(|fields| fields.get(key.key()).cloned()))
            })
            .await
    }
}
