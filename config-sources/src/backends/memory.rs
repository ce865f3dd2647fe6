//! In-memory backends for tests and local development.
//!
//! Every store counts the calls it receives so callers can check how many
//! remote round-trips a source would have made.

use super::{
    ObjectStore, Parameter, ParameterPage, ParameterStore, RowLookup, RowStore, SecretStore,
};
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: HashMap<(String, String), String>,
    calls: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(
        mut self,
        bucket: impl Into<String>,
        key: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        self.objects.insert((bucket.into(), key.into()), body.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .objects
            .get(&(bucket.to_string(), key.to_string()))
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryRowStore {
    tables: HashMap<String, HashMap<(String, String), String>>,
    calls: AtomicUsize,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.tables.entry(table.into()).or_default();
        self
    }

    pub fn with_row(
        mut self,
        table: impl Into<String>,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.tables
            .entry(table.into())
            .or_default()
            .insert((section.into(), key.into()), value.into());
        self
    }

    /// Number of `get_value` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        Ok(self.tables.contains_key(table))
    }

    async fn get_value(&self, lookup: &RowLookup) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.get(&lookup.table).and_then(|rows| {
            rows.get(&(lookup.section.clone(), lookup.key.clone()))
                .cloned()
        }))
    }
}

#[derive(Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
    calls: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), body.into());
        self
    }

    /// Builds a JSON object body from `fields`.
    pub fn with_fields<'a, I>(self, name: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let body: serde_json::Map<String, serde_json::Value> = fields
            .into_iter()
            .map(|(key, value)| (key.to_string(), serde_json::Value::from(value)))
            .collect();
        self.with_secret(name, serde_json::Value::Object(body).to_string())
    }

    /// Number of `get_secret` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn has_secrets_under(&self, prefix: &str) -> Result<bool> {
        let scope = format!("{prefix}/");
        Ok(self.secrets.keys().any(|name| name.starts_with(&scope)))
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.secrets.get(name).cloned())
    }
}

pub struct MemoryParameterStore {
    parameters: BTreeMap<String, String>,
    page_size: usize,
    max_batch: usize,
    get_calls: AtomicUsize,
    batch_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self {
            parameters: BTreeMap::new(),
            page_size: 10,
            max_batch: 10,
            get_calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Parameters returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Largest batch `get_parameters` accepts, mirroring the AWS validation
    /// error for oversized requests.
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.get_calls() + self.batch_calls() + self.list_calls()
    }
}

#[async_trait]
impl ParameterStore for MemoryParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.parameters.get(name).cloned())
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if names.len() > self.max_batch {
            return Err(ConfigSourceError::transport(
                "GetParameters",
                format!(
                    "batch of {} names exceeds the limit of {}",
                    names.len(),
                    self.max_batch
                ),
            ));
        }

        Ok(names
            .iter()
            .filter_map(|name| {
                self.parameters
                    .get(name)
                    .map(|value| Parameter::new(name.clone(), value.clone()))
            })
            .collect())
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
        max_results: Option<i32>,
    ) -> Result<ParameterPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let start = match next_token {
            Some(token) => token.parse::<usize>().map_err(|e| {
                ConfigSourceError::transport("GetParametersByPath", format!("bad token: {e}"))
            })?,
            None => 0,
        };
        let page_size = max_results
            .and_then(|max| usize::try_from(max).ok())
            .unwrap_or(self.page_size)
            .min(self.page_size)
            .max(1);

        let scope = format!("{}/", path.trim_end_matches('/'));
        let matching: Vec<Parameter> = self
            .parameters
            .iter()
            .filter(|(name, _)| name.starts_with(&scope))
            .map(|(name, value)| Parameter::new(name.clone(), value.clone()))
            .collect();

        let end = start.saturating_add(page_size).min(matching.len());
        let parameters = matching.get(start..end).map(<[Parameter]>::to_vec).unwrap_or_default();
        let next_token = (end < matching.len()).then(|| end.to_string());

        Ok(ParameterPage {
            parameters,
            next_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parameter_listing_pages_until_exhausted() {
        let store = MemoryParameterStore::new()
            .with_page_size(2)
            .with_parameter("/app/s/a", "1")
            .with_parameter("/app/s/b", "2")
            .with_parameter("/app/t/c", "3")
            .with_parameter("/other/s/a", "x");

        let first = store.get_parameters_by_path("/app", None, None).await.unwrap();
        assert_eq!(first.parameters.len(), 2);
        let token = first.next_token.clone();
        assert!(token.is_some());

        let second = store.get_parameters_by_path("/app", token, None).await.unwrap();
        assert_eq!(second.parameters, vec![Parameter::new("/app/t/c", "3")]);
        assert!(second.next_token.is_none());
        assert_eq!(store.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_secret_prefix_stops_at_separator() {
        let store = MemorySecretStore::new().with_secret("application/s", "{}");

        assert!(store.has_secrets_under("application").await.unwrap());
        assert!(!store.has_secrets_under("app").await.unwrap());
        assert!(!store.has_secrets_under("application/s").await.unwrap());
    }

    #[tokio::test]
    async fn test_oversized_batch_rejected() {
        let store = MemoryParameterStore::new().with_max_batch(2);
        let names: Vec<String> = (0..3).map(|i| format!("/app/s/{i}")).collect();
        assert!(store.get_parameters(&names).await.is_err());
    }
}
