//! Lookup pipeline shared by every source: normalize, filter, fetch, enforce
//! existence.

use crate::config::SourceOptions;
use crate::key::{ConfigKey, KeyFilter};
use crate::{ConfigSourceError, Result};
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KeyResolver {
    must_exist: bool,
    filter: KeyFilter,
}

impl KeyResolver {
    pub fn new(must_exist: bool, filter: KeyFilter) -> Self {
        Self { must_exist, filter }
    }

    pub fn from_options(options: &SourceOptions) -> Self {
        Self::new(options.must_exist, options.key_filter())
    }

    pub fn must_exist(&self) -> bool {
        self.must_exist
    }

    pub fn filter(&self) -> &KeyFilter {
        &self.filter
    }

    /// Runs one lookup. `fetch` only sees keys that passed the filter and is
    /// never called for filtered-out keys.
    pub async fn resolve<F, Fut>(
        &self,
        section: &str,
        key: &str,
        fetch: F,
    ) -> Result<Option<String>>
    where
        F: FnOnce(ConfigKey) -> Fut,
        Fut: Future<Output = Result<Option<String>>>,
    {
        let key = ConfigKey::new(section, key);

        if !self.filter.allows(&key) {
            debug!(%key, "Key excluded by only_these_keys");
            return self.absent(key);
        }

        match fetch(key.clone()).await? {
            Some(value) => Ok(Some(value)),
            None => self.absent(key),
        }
    }

    fn absent(&self, key: ConfigKey) -> Result<Option<String>> {
        if self.must_exist {
            let (section, key): (String, String) = key.into();
            Err(ConfigSourceError::KeyNotFound { section, key })
        } else {
            Ok(None)
        }
    }
}
