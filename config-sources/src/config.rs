//! Configuration for remote configuration sources

use crate::key::{ConfigKey, KeyFilter};
use crate::{ConfigSourceError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Largest `GetParameters` request AWS accepts.
pub const DEFAULT_PARAMETER_BATCH_SIZE: usize = 10;

/// Settings shared by every source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceOptions {
    /// Make a missing locator a construction error and a missing key a
    /// lookup error, instead of "no value".
    #[serde(default)]
    pub must_exist: bool,

    /// Restrict the source to these keys. `None` means no restriction.
    #[serde(default)]
    pub only_these_keys: Option<HashSet<ConfigKey>>,
}

impl SourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_exist(mut self, must_exist: bool) -> Self {
        self.must_exist = must_exist;
        self
    }

    pub fn only_these_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ConfigKey>,
    {
        self.only_these_keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn key_filter(&self) -> KeyFilter {
        KeyFilter::from(self.only_these_keys.clone())
    }
}

/// AWS client settings. Credentials come from the default provider chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsClientConfig {
    pub region: Option<String>,
    /// Override for local stacks (e.g. LocalStack, MinIO).
    pub endpoint_url: Option<String>,
}

impl AwsClientConfig {
    pub async fn load(&self) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &self.region {
            loader = loader.region(aws_config::Region::new(region.clone()));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultClientConfig {
    pub address: String,
    pub token: Option<String>,
    #[serde(default = "default_vault_mount")]
    pub mount_path: String,
}

fn default_vault_mount() -> String {
    "secret".to_string()
}

/// INI document stored as a single object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IniObjectConfig {
    pub bucket: String,
    pub key: String,
    #[serde(flatten)]
    pub options: SourceOptions,
}

impl IniObjectConfig {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            options: SourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn locator(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("bucket", &self.bucket)?;
        require_non_empty("key", &self.key)
    }
}

/// Table whose rows hold one value each, addressed by a section/key
/// composite key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowStoreConfig {
    pub table_name: String,
    #[serde(default = "default_section_attribute")]
    pub section_attribute_name: String,
    #[serde(default = "default_key_attribute")]
    pub key_attribute_name: String,
    #[serde(default = "default_value_attribute")]
    pub value_attribute_name: String,
    #[serde(flatten)]
    pub options: SourceOptions,
}

fn default_section_attribute() -> String {
    "section".to_string()
}

fn default_key_attribute() -> String {
    "key".to_string()
}

fn default_value_attribute() -> String {
    "value".to_string()
}

impl RowStoreConfig {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            section_attribute_name: default_section_attribute(),
            key_attribute_name: default_key_attribute(),
            value_attribute_name: default_value_attribute(),
            options: SourceOptions::default(),
        }
    }

    pub fn with_attributes(
        mut self,
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.section_attribute_name = section.into();
        self.key_attribute_name = key.into();
        self.value_attribute_name = value.into();
        self
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("table_name", &self.table_name)?;
        require_non_empty("section_attribute_name", &self.section_attribute_name)?;
        require_non_empty("key_attribute_name", &self.key_attribute_name)?;
        require_non_empty("value_attribute_name", &self.value_attribute_name)
    }
}

/// One secret per section, named `prefix/section`, holding a JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretBlobConfig {
    pub prefix: String,
    #[serde(flatten)]
    pub options: SourceOptions,
}

impl SecretBlobConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            options: SourceOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_non_empty("prefix", &self.prefix)
    }
}

/// One parameter per key, named `prefix/section/key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterStoreConfig {
    pub prefix: String,
    /// Fetch every allowed key in batches at construction.
    #[serde(default)]
    pub batch_preload: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(flatten)]
    pub options: SourceOptions,
}

fn default_batch_size() -> usize {
    DEFAULT_PARAMETER_BATCH_SIZE
}

impl ParameterStoreConfig {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            batch_preload: false,
            batch_size: DEFAULT_PARAMETER_BATCH_SIZE,
            options: SourceOptions::default(),
        }
    }

    pub fn batch_preload(mut self, batch_preload: bool) -> Self {
        self.batch_preload = batch_preload;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = options;
        self
    }

    /// An empty prefix lists from the root. Anything else must be an absolute
    /// hierarchy path, as `GetParametersByPath` requires.
    pub fn validate(&self) -> Result<()> {
        if !self.prefix.is_empty() && !self.prefix.starts_with('/') {
            return Err(ConfigSourceError::Configuration(format!(
                "prefix must start with '/': {}",
                self.prefix
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigSourceError::Configuration(
                "batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// A source description, as found in an application's configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    IniObject {
        #[serde(flatten)]
        source: IniObjectConfig,
        #[serde(default)]
        client: AwsClientConfig,
    },
    RowStore {
        #[serde(flatten)]
        source: RowStoreConfig,
        #[serde(default)]
        client: AwsClientConfig,
    },
    SecretsManager {
        #[serde(flatten)]
        source: SecretBlobConfig,
        #[serde(default)]
        client: AwsClientConfig,
    },
    Vault {
        #[serde(flatten)]
        source: SecretBlobConfig,
        client: VaultClientConfig,
    },
    ParameterStore {
        #[serde(flatten)]
        source: ParameterStoreConfig,
        #[serde(default)]
        client: AwsClientConfig,
    },
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConfigSourceError::Configuration(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_default_to_lenient_unfiltered() {
        let options = SourceOptions::default();
        assert!(!options.must_exist);
        assert!(!options.key_filter().is_restricted());
    }

    #[test]
    fn test_row_store_default_attribute_names() {
        let config: RowStoreConfig =
            serde_json::from_str(r#"{"table_name": "app-config"}"#).unwrap();
        assert_eq!(config.section_attribute_name, "section");
        assert_eq!(config.key_attribute_name, "key");
        assert_eq!(config.value_attribute_name, "value");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parameter_store_prefix_must_be_absolute() {
        assert!(ParameterStoreConfig::new("/app").validate().is_ok());
        assert!(ParameterStoreConfig::new("").validate().is_ok());
        assert!(matches!(
            ParameterStoreConfig::new("app/prod").validate(),
            Err(ConfigSourceError::Configuration(_))
        ));
    }

    #[test]
    fn test_parameter_store_rejects_zero_batch() {
        let config = ParameterStoreConfig::new("/app").batch_size(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigSourceError::Configuration(_))
        ));
    }

    #[test]
    fn test_ini_object_rejects_empty_bucket() {
        assert!(IniObjectConfig::new(" ", "config.ini").validate().is_err());
        assert_eq!(
            IniObjectConfig::new("bucket", "app/config.ini").locator(),
            "s3://bucket/app/config.ini"
        );
    }

    #[test]
    fn test_source_config_deserializes_tagged() {
        let json = r#"{
            "type": "parameter_store",
            "prefix": "/rustcare/prod",
            "batch_preload": true,
            "must_exist": true,
            "only_these_keys": [["Database", "Url"], ["database", "pool_size"]],
            "client": {"region": "eu-west-1"}
        }"#;

        let config: SourceConfig = serde_json::from_str(json).unwrap();
        let SourceConfig::ParameterStore { source, client } = config else {
            panic!("expected parameter store config");
        };

        assert_eq!(source.prefix, "/rustcare/prod");
        assert!(source.batch_preload);
        assert_eq!(source.batch_size, DEFAULT_PARAMETER_BATCH_SIZE);
        assert!(source.options.must_exist);
        let filter = source.options.key_filter();
        assert!(filter.allows(&ConfigKey::new("database", "url")));
        assert!(filter.allows(&ConfigKey::new("DATABASE", "POOL_SIZE")));
        assert_eq!(client.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_vault_config_defaults_mount() {
        let json = r#"{
            "type": "vault",
            "prefix": "rustcare",
            "client": {"address": "http://127.0.0.1:8200", "token": "root"}
        }"#;

        let config: SourceConfig = serde_json::from_str(json).unwrap();
        let SourceConfig::Vault { source, client } = config else {
            panic!("expected vault config");
        };
        assert_eq!(source.prefix, "rustcare");
        assert!(!source.options.must_exist);
        assert_eq!(client.mount_path, "secret");
    }
}
