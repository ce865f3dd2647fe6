//! AWS S3 object store

use super::ObjectStore;
use crate::config::AwsClientConfig;
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Create from AWS config
    pub async fn from_config(config: &AwsClientConfig) -> Self {
        let sdk_config = config.load().await;
        Self::new(S3Client::new(&sdk_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Option<String>> {
        debug!(bucket, key, "Fetching object from S3");

        let response = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(response) => response,
            Err(err) => {
                let missing = err.as_service_error().is_some_and(|service| {
                    service.is_no_such_key() || service.code() == Some("NoSuchBucket")
                });
                if missing {
                    return Ok(None);
                }
                return Err(ConfigSourceError::transport("S3 GetObject", err));
            }
        };

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| ConfigSourceError::transport("S3 GetObject body", e))?
            .into_bytes();

        let text = String::from_utf8(bytes.to_vec())
            .map_err(|e| ConfigSourceError::malformed(format!("s3://{bucket}/{key}"), e))?;

        Ok(Some(text))
    }
}
