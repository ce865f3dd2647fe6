//! AWS Secrets Manager secret store

use super::SecretStore;
use crate::config::AwsClientConfig;
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use aws_sdk_secretsmanager::Client;
use tracing::debug;

pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create from AWS config
    pub async fn from_config(config: &AwsClientConfig) -> Self {
        let sdk_config = config.load().await;
        Self::new(Client::new(&sdk_config))
    }
}

#[async_trait]
impl SecretStore for SecretsManagerStore {
    async fn has_secrets_under(&self, prefix: &str) -> Result<bool> {
        // The name filter matches by prefix, so anchor it on the separator.
        let scope = format!("{prefix}/");
        let filter = Filter::builder()
            .key(FilterNameStringType::Name)
            .values(&scope)
            .build();

        let mut next_token = None;
        loop {
            let response = self
                .client
                .list_secrets()
                .filters(filter.clone())
                .max_results(1)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| ConfigSourceError::transport("Secrets Manager ListSecrets", e))?;

            let found = response
                .secret_list()
                .iter()
                .filter_map(|secret| secret.name())
                .any(|name| name.starts_with(&scope));
            if found {
                return Ok(true);
            }

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => return Ok(false),
            }
        }
    }

    async fn get_secret(&self, name: &str) -> Result<Option<String>> {
        debug!(name, "Getting secret from AWS Secrets Manager");

        let response = match self.client.get_secret_value().secret_id(name).send().await {
            Ok(response) => response,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_resource_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(err) => {
                return Err(ConfigSourceError::transport(
                    "Secrets Manager GetSecretValue",
                    err,
                ))
            }
        };

        match response.secret_string() {
            Some(value) => Ok(Some(value.to_string())),
            None => Err(ConfigSourceError::malformed(
                format!("secretsmanager://{name}"),
                "secret has no string value",
            )),
        }
    }
}
