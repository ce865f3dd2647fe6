//! AWS Systems Manager Parameter Store

use super::{Parameter, ParameterPage, ParameterStore};
use crate::config::AwsClientConfig;
use crate::{ConfigSourceError, Result};
use async_trait::async_trait;
use aws_sdk_ssm::Client as SsmClient;
use tracing::debug;

pub struct SsmParameterStore {
    client: SsmClient,
}

impl SsmParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }

    /// Create from AWS config
    pub async fn from_config(config: &AwsClientConfig) -> Self {
        let sdk_config = config.load().await;
        Self::new(SsmClient::new(&sdk_config))
    }

    fn to_parameters(parameters: &[aws_sdk_ssm::types::Parameter]) -> Vec<Parameter> {
        parameters
            .iter()
            .filter_map(|parameter| match (parameter.name(), parameter.value()) {
                (Some(name), Some(value)) => Some(Parameter::new(name, value)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<Option<String>> {
        debug!(name, "Getting parameter from SSM");

        match self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
        {
            Ok(response) => Ok(response
                .parameter()
                .and_then(|parameter| parameter.value())
                .map(str::to_string)),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service| service.is_parameter_not_found()) =>
            {
                Ok(None)
            }
            Err(err) => Err(ConfigSourceError::transport("SSM GetParameter", err)),
        }
    }

    async fn get_parameters(&self, names: &[String]) -> Result<Vec<Parameter>> {
        debug!(count = names.len(), "Getting parameter batch from SSM");

        let response = self
            .client
            .get_parameters()
            .set_names(Some(names.to_vec()))
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| ConfigSourceError::transport("SSM GetParameters", e))?;

        Ok(Self::to_parameters(response.parameters()))
    }

    async fn get_parameters_by_path(
        &self,
        path: &str,
        next_token: Option<String>,
        max_results: Option<i32>,
    ) -> Result<ParameterPage> {
        debug!(path, "Listing parameters from SSM");

        let response = self
            .client
            .get_parameters_by_path()
            .path(path)
            .recursive(true)
            .with_decryption(true)
            .set_next_token(next_token)
            .set_max_results(max_results)
            .send()
            .await
            .map_err(|e| ConfigSourceError::transport("SSM GetParametersByPath", e))?;

        Ok(ParameterPage {
            parameters: Self::to_parameters(response.parameters()),
            next_token: response.next_token().map(str::to_string),
        })
    }
}
