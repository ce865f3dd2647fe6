//! Hierarchical parameter store, one parameter per `prefix/section/key`

use crate::backends::{ParameterStore, SsmParameterStore};
use crate::cache::FetchCache;
use crate::config::{AwsClientConfig, ParameterStoreConfig};
use crate::key::{normalize, ConfigKey, KeyFilter};
use crate::resolver::KeyResolver;
use crate::{ConfigSource, ConfigSourceError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves keys from individual parameters.
///
/// Without `batch_preload`, each key costs one `get_parameter` call the first
/// time it is asked for. With `batch_preload`, every value the source can ever
/// return is loaded at construction and lookups never touch the backend:
///
/// - with `only_these_keys`, the allowed paths are requested through
///   `get_parameters` in chunks of `batch_size`;
/// - without a filter, the whole prefix is listed page by page.
pub struct ParameterStoreSource {
    store: Arc<dyn ParameterStore>,
    prefix: String,
    resolver: KeyResolver,
    cache: FetchCache<String>,
    preloaded: bool,
}

impl ParameterStoreSource {
    pub async fn new(store: Arc<dyn ParameterStore>, config: ParameterStoreConfig) -> Result<Self> {
        config.validate()?;

        let mut source = Self {
            store,
            prefix: config.prefix.trim_end_matches('/').to_string(),
            resolver: KeyResolver::from_options(&config.options),
            cache: FetchCache::new(),
            preloaded: false,
        };

        let listed = if config.batch_preload {
            source.preload(config.batch_size).await?
        } else {
            None
        };

        if source.resolver.must_exist() {
            let exists = match listed {
                Some(count) => count > 0,
                None => source.prefix_has_parameters().await?,
            };
            if !exists {
                return Err(ConfigSourceError::LocatorUnavailable {
                    locator: format!("ssm://{}", source.listing_path()),
                });
            }
        }

        info!(
            prefix = %source.prefix,
            preloaded = source.preloaded,
            cached = source.cache.len(),
            "Initialized parameter store configuration source"
        );

        Ok(source)
    }

    /// Create against SSM Parameter Store.
    pub async fn from_aws(config: ParameterStoreConfig, client: &AwsClientConfig) -> Result<Self> {
        config.validate()?;
        let store = SsmParameterStore::from_config(client).await;
        Self::new(Arc::new(store), config).await
    }

    /// Full parameter name for a key.
    pub fn parameter_path(&self, key: &ConfigKey) -> String {
        format!("{}/{}/{}", self.prefix, key.section(), key.key())
    }

    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    /// Every cached answer keyed by parameter path. After a filtered preload
    /// this holds exactly one entry per allowed key.
    pub fn cached_parameters(&self) -> HashMap<String, Option<String>> {
        self.cache.snapshot()
    }

    fn listing_path(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    async fn prefix_has_parameters(&self) -> Result<bool> {
        let mut next_token = None;
        loop {
            let page = self
                .store
                .get_parameters_by_path(self.listing_path(), next_token, Some(1))
                .await?;
            if !page.parameters.is_empty() {
                return Ok(true);
            }
            match page.next_token {
                Some(token) => next_token = Some(token),
                None => return Ok(false),
            }
        }
    }

    /// Loads every value the source may return. Returns how many parameters
    /// the prefix listing saw, or `None` when no listing was needed.
    async fn preload(&mut self, batch_size: usize) -> Result<Option<usize>> {
        let listed = match self.resolver.filter().keys() {
            Some(keys) => {
                let mut paths: Vec<String> =
                    keys.iter().map(|key| self.parameter_path(key)).collect();
                paths.sort();
                self.preload_paths(&paths, batch_size).await?;
                None
            }
            None => Some(self.preload_prefix().await?),
        };

        self.preloaded = true;
        Ok(listed)
    }

    async fn preload_paths(&self, paths: &[String], batch_size: usize) -> Result<()> {
        for chunk in paths.chunks(batch_size) {
            debug!(count = chunk.len(), "Preloading parameter batch");

            let mut found: HashMap<String, String> = self
                .store
                .get_parameters(chunk)
                .await?
                .into_iter()
                .map(|parameter| (parameter.name, parameter.value))
                .collect();

            for path in chunk {
                self.cache.insert(path.clone(), found.remove(path));
            }
        }
        Ok(())
    }

    async fn preload_prefix(&self) -> Result<usize> {
        let mut next_token = None;
        let mut pages = 0usize;
        let mut listed = 0usize;

        loop {
            let page = self
                .store
                .get_parameters_by_path(self.listing_path(), next_token, None)
                .await?;
            pages += 1;
            listed += page.parameters.len();

            for parameter in page.parameters {
                if let Some(path) = self.addressable_path(&parameter.name) {
                    self.cache.insert(path, Some(parameter.value));
                } else {
                    debug!(name = %parameter.name, "Skipping parameter outside section/key layout");
                }
            }

            match page.next_token {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(pages, listed, "Preloaded parameter prefix");
        Ok(listed)
    }

    /// The listed name as a lookup would request it, or `None` if it is not
    /// exactly `prefix/section/key` in lowercase. Parameter names are case
    /// sensitive, so a mixed-case name is never reachable by a lookup.
    fn addressable_path(&self, name: &str) -> Option<String> {
        let relative = name.strip_prefix(&self.prefix)?.strip_prefix('/')?;
        let (section, key) = relative.split_once('/')?;
        if section.is_empty() || key.is_empty() || key.contains('/') {
            return None;
        }
        if normalize(section) != section || normalize(key) != key {
            return None;
        }
        Some(name.to_string())
    }

    async fn lookup(&self, key: ConfigKey) -> Result<Option<String>> {
        let path = self.parameter_path(&key);
        if self.preloaded {
            return Ok(self.cache.get(&path).flatten());
        }
        self.cache
            .get_or_fetch(&path, || self.store.get_parameter(&path))
            .await
    }

    pub fn filter(&self) -> &KeyFilter {
        self.resolver.filter()
    }
}

#[async_trait]
impl ConfigSource for ParameterStoreSource {
    fn name(&self) -> &str {
        "ssm-parameter-store"
    }

    async fn get_config_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        self.resolver
            .resolve(section, key, |key| self.lookup(key))
            .await
    }
}
