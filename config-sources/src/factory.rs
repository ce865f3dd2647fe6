//! Builds sources from their configuration

use crate::config::SourceConfig;
use crate::sources::{IniObjectSource, ParameterStoreSource, RowStoreSource, SecretBlobSource};
use crate::{ConfigSource, Result};
use std::sync::Arc;
use tracing::info;

/// Creates the source described by `config` against its real backend.
pub async fn build_source(config: SourceConfig) -> Result<Arc<dyn ConfigSource>> {
    let source: Arc<dyn ConfigSource> = match config {
        SourceConfig::IniObject { source, client } => {
            info!(bucket = %source.bucket, key = %source.key, "Initializing S3 INI source");
            Arc::new(IniObjectSource::from_aws(source, &client).await?)
        }
        SourceConfig::RowStore { source, client } => {
            info!(table = %source.table_name, "Initializing DynamoDB source");
            Arc::new(RowStoreSource::from_aws(source, &client).await?)
        }
        SourceConfig::SecretsManager { source, client } => {
            info!(prefix = %source.prefix, "Initializing AWS Secrets Manager source");
            Arc::new(SecretBlobSource::from_aws(source, &client).await?)
        }
        SourceConfig::Vault { source, client } => {
            info!(prefix = %source.prefix, address = %client.address, "Initializing Vault source");
            Arc::new(SecretBlobSource::from_vault(source, &client).await?)
        }
        SourceConfig::ParameterStore { source, client } => {
            info!(prefix = %source.prefix, "Initializing SSM Parameter Store source");
            Arc::new(ParameterStoreSource::from_aws(source, &client).await?)
        }
    };

    Ok(source)
}

/// Builds every source in order, failing on the first error.
pub async fn build_sources(configs: Vec<SourceConfig>) -> Result<Vec<Arc<dyn ConfigSource>>> {
    let mut sources = Vec::with_capacity(configs.len());
    for config in configs {
        sources.push(build_source(config).await?);
    }
    Ok(sources)
}
