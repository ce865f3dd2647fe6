//! Fetch-once cache shared by all sources

use crate::Result;
use dashmap::DashMap;
use std::future::Future;
use tracing::debug;

/// Process-lifetime cache from a backend-native identifier to the backend's
/// answer. `None` records a confirmed absence so it is not fetched again.
///
/// Entries are never evicted or overwritten: the first answer inserted for an
/// identifier wins, even when two callers raced on the same miss.
pub struct FetchCache<V> {
    entries: DashMap<String, Option<V>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached answer for `id`. The outer `Option` is the cache hit/miss.
    pub fn get(&self, id: &str) -> Option<Option<V>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// Records an answer unless one is already present, and returns the
    /// answer that ended up cached.
    pub fn insert(&self, id: String, value: Option<V>) -> Option<V> {
        self.entries.entry(id).or_insert(value).value().clone()
    }

    /// Returns the cached answer, or runs `fetch` once and caches its result.
    /// Errors from `fetch` are returned and not cached.
    pub async fn get_or_fetch<F, Fut>(&self, id: &str, fetch: F) -> Result<Option<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>>>,
    {
        if let Some(cached) = self.get(id) {
            debug!(id, "Cache hit");
            return Ok(cached);
        }

        let fetched = fetch().await?;
        Ok(self.insert(id.to_string(), fetched))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of every cached answer, keyed by identifier.
    pub fn snapshot(&self) -> std::collections::HashMap<String, Option<V>> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

impl<V: Clone> Default for FetchCache<V> {
    fn default() -> Self {
        Self::new()
    }
}
