//! Backend clients. Each trait is the outbound contract of one source kind and
//! separates "not found" (`Ok(None)` / `Ok(false)`) from every other failure.

pub mod dynamodb;
pub mod memory;
pub mod s3;
pub mod secrets_manager;
pub mod ssm;
pub mod vault;

pub use dynamodb::DynamoDbRowStore;
pub use memory::{MemoryObjectStore, MemoryParameterStore, MemoryRowStore, MemorySecretStore};
pub use s3::S3ObjectStore;
pub use secrets_manager::SecretsManagerStore;
pub use ssm::SsmParameterStore;
pub use vault::VaultKvStore;

use crate::Result;
use async_trait::async_trait;

/// Object storage holding whole documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Body of the object as UTF-8 text; `None` if the bucket or the object
    /// does not exist.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<String>>;
}

/// Point lookup of a single attribute in a table keyed by
/// `(section_attribute, key_attribute)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLookup {
    pub table: String,
    pub section_attribute: String,
    pub section: String,
    pub key_attribute: String,
    pub key: String,
    pub value_attribute: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// `None` if the table, the row or the value attribute is missing.
    async fn get_value(&self, lookup: &RowLookup) -> Result<Option<String>>;
}

/// Named secrets whose body is text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Whether at least one secret lives under `prefix`.
    async fn has_secrets_under(&self, prefix: &str) -> Result<bool>;

    async fn get_secret(&self, name: &str) -> Result<Option<String>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One page of a recursive listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    pub parameters: Vec<Parameter>,
    pub next_token: Option<String>,
}

/// Hierarchical parameter store. Values are returned decrypted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>>;

    /// Fetches several parameters in one call. Names the backend does not
    /// know are simply missing from the result.
    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>>;

    /// Recursive listing under `path`, one page at a time.
    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
        max_results: Option<i32>,
    ) -> Result<ParameterPage>;
}
