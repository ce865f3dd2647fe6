//! AWS DynamoDB row store

use super::{RowLookup, RowStore};
use crate::config::AwsClientConfig;
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use tracing::debug;

pub struct DynamoDbRowStore {
    client: DynamoDbClient,
}

impl DynamoDbRowStore {
    pub fn new(client: DynamoDbClient) -> Self {
        Self { client }
    }

    /// Create from AWS config
    pub async fn from_config(config: &AwsClientConfig) -> Self {
        let sdk_config = config.load().await;
        Self::new(DynamoDbClient::new(&sdk_config))
    }
}

#[async_trait]
impl RowStore for DynamoDbRowStore {
    async fn table_exists(&self, table: &str) -> Result<bool> {
        match self.client.describe_table().table_name(table).send().await {
            Ok(_) => Ok(true),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                Ok(false)
            }
            Err(err) => Err(ConfigSourceError::transport("DynamoDB DescribeTable", err)),
        }
    }

    async fn get_value(&self, lookup: &RowLookup) -> Result<Option<String>> {
        debug!(
            table = %lookup.table,
            section = %lookup.section,
            key = %lookup.key,
            "Fetching row from DynamoDB"
        );

        let response = self
            .client
            .get_item()
            .table_name(&lookup.table)
            .key(&lookup.section_attribute, AttributeValue::S(lookup.section.clone()))
            .key(&lookup.key_attribute, AttributeValue::S(lookup.key.clone()))
            .projection_expression("#v")
            .expression_attribute_names("#v", &lookup.value_attribute)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(ConfigSourceError::transport("DynamoDB GetItem", err)),
        };

        let Some(value) = response
            .item()
            .and_then(|item| item.get(&lookup.value_attribute))
        else {
            return Ok(None);
        };

        match value {
            AttributeValue::S(text) | AttributeValue::N(text) => Ok(Some(text.clone())),
            other => Err(ConfigSourceError::malformed(
                format!("dynamodb://{}", lookup.table),
                format!(
                    "attribute {} of [{}] {} is not a string or number: {:?}",
                    lookup.value_attribute, lookup.section, lookup.key, other
                ),
            )),
        }
    }
}
