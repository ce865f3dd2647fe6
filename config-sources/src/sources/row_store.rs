//! Two-attribute table where each row holds one value

use crate::backends::{DynamoDbRowStore, RowLookup, RowStore};
use crate::cache::FetchCache;
use crate::config::{AwsClientConfig, RowStoreConfig};
use crate::key::ConfigKey;
use crate::resolver::KeyResolver;
use crate::{ConfigSource, ConfigSourceError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Point lookup per key, cached for the lifetime of the source.
pub struct RowStoreSource {
    store: Arc<dyn RowStore>,
    config: RowStoreConfig,
    resolver: KeyResolver,
    cache: FetchCache<String>,
}

impl RowStoreSource {
    pub async fn new(store: Arc<dyn RowStore>, config: RowStoreConfig) -> Result<Self> {
        config.validate()?;
        let resolver = KeyResolver::from_options(&config.options);

        if resolver.must_exist() && !store.table_exists(&config.table_name).await? {
            return Err(ConfigSourceError::LocatorUnavailable {
                locator: format!("dynamodb://{}", config.table_name),
            });
        }

        info!(table = %config.table_name, "Initialized row store configuration source");

        Ok(Self {
            store,
            config,
            resolver,
            cache: FetchCache::new(),
        })
    }

    /// Create against DynamoDB using the given AWS client settings.
    pub async fn from_aws(config: RowStoreConfig, client: &AwsClientConfig) -> Result<Self> {
        config.validate()?;
        let store = DynamoDbRowStore::from_config(client).await;
        Self::new(Arc::new(store), config).await
    }

    fn lookup_for(&self, key: &ConfigKey) -> RowLookup {
        RowLookup {
            table: self.config.table_name.clone(),
            section_attribute: self.config.section_attribute_name.clone(),
            section: key.section().to_string(),
            key_attribute: self.config.key_attribute_name.clone(),
            key: key.key().to_string(),
            value_attribute: self.config.value_attribute_name.clone(),
        }
    }

    /// Number of keys with a cached answer (present or absent).
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}

/// Composite row identity, joined with the ASCII unit separator.
fn row_id(key: &ConfigKey) -> String {
    format!("{}\u{1f}{}", key.section(), key.key())
}

#[async_trait]
impl ConfigSource for RowStoreSource {
    fn name(&self) -> &str {
        "dynamodb"
    }

    async fn get_config_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        self.resolver
            .resolve(section, key, |key| async move {
                let lookup = self.lookup_for(&key);
                self.cache
                    .get_or_fetch(&row_id(&key), || self.store.get_value(&lookup))
                    .await
            })
            .await
    }
}
