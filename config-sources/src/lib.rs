//! # RustCare Config Sources
//!
//! Read-only configuration sources that resolve `(section, key)` pairs from
//! remote key/value stores. A typed configuration layer merges several
//! sources by priority; this crate only answers "what value does this source
//! hold for this key, if any".
//!
//! ## Supported Backends:
//! - INI document in AWS S3
//! - AWS DynamoDB table (one row per key)
//! - AWS Secrets Manager or HashiCorp Vault (one secret per section)
//! - AWS SSM Parameter Store (one parameter per key, optional batch preload)
//!
//! ## Shared lookup contract:
//! - Section and key are matched case-insensitively
//! - `only_these_keys` restricts a source without any remote call
//! - `must_exist` turns absence into an error, at construction for the
//!   backend resource and at lookup for a key
//! - Every remote answer, including "not there", is cached for the lifetime
//!   of the source
//!
//! # Example
//!
//! ```rust,no_run
//! use config_sources::{ConfigSource, ParameterStoreConfig, ParameterStoreSource, SourceOptions};
//! use config_sources::config::AwsClientConfig;
//!
//! # async fn run() -> config_sources::Result<()> {
//! let config = ParameterStoreConfig::new("/rustcare/prod")
//!     .batch_preload(true)
//!     .with_options(
//!         SourceOptions::new()
//!             .must_exist(true)
//!             .only_these_keys([("database", "url"), ("database", "pool_size")]),
//!     );
//!
//! let source = ParameterStoreSource::from_aws(config, &AwsClientConfig::default()).await?;
//! let url = source.get_config_value("Database", "URL").await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod cache;
pub mod config;
pub mod error;
pub mod factory;
pub mod key;
pub mod resolver;
pub mod sources;

pub use crate::config::{
    IniObjectConfig, ParameterStoreConfig, RowStoreConfig, SecretBlobConfig, SourceConfig,
    SourceOptions,
};
pub use error::*;
pub use factory::{build_source, build_sources};
pub use key::{ConfigKey, KeyFilter};
pub use sources::{IniObjectSource, ParameterStoreSource, RowStoreSource, SecretBlobSource};

use async_trait::async_trait;

/// Result type for configuration sources
pub type Result<T> = std::result::Result<T, ConfigSourceError>;

/// A read-only source of configuration values.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// Source name, for logs and diagnostics
    fn name(&self) -> &str;

    /// Value stored for `(section, key)`, or `None` if this source has no
    /// opinion. With `must_exist`, absence is a
    /// [`ConfigSourceError::KeyNotFound`] instead.
    async fn get_config_value(&self, section: &str, key: &str) -> Result<Option<String>>;
}
