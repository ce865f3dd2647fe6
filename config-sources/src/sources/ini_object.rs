//! INI document stored in object storage

use crate::backends::{ObjectStore, S3ObjectStore};
use crate::config::{AwsClientConfig, IniObjectConfig};
use crate::key::normalize;
use crate::resolver::KeyResolver;
use crate::{ConfigSource, ConfigSourceError, Result};
use async_trait::async_trait;
use ini::Ini;
use std::collections::HashMap;
use tracing::{info, warn};

/// Parsed INI tree with lowercased section and key names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniDocument {
    /// Parses INI text. Keys that sit outside any section are dropped since
    /// nothing can address them. Section names are taken verbatim, so
    /// `[db.primary]` is one section.
    pub fn parse(locator: &str, text: &str) -> Result<Self> {
        let parsed =
            Ini::load_from_str(text).map_err(|e| ConfigSourceError::malformed(locator, e))?;

        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        for (section, properties) in parsed.iter() {
            let Some(section) = section else {
                continue;
            };

            let target = sections.entry(normalize(section)).or_default();
            for (key, value) in properties.iter() {
                target.insert(normalize(key), value.to_string());
            }
        }

        Ok(Self { sections })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }
}

/// Whole INI document fetched and parsed once at construction.
pub struct IniObjectSource {
    locator: String,
    resolver: KeyResolver,
    document: IniDocument,
}

impl IniObjectSource {
    pub async fn new(store: &dyn ObjectStore, config: IniObjectConfig) -> Result<Self> {
        config.validate()?;
        let locator = config.locator();
        let resolver = KeyResolver::from_options(&config.options);

        let document = match store.get_object(&config.bucket, &config.key).await? {
            Some(text) => IniDocument::parse(&locator, &text)?,
            None if resolver.must_exist() => {
                return Err(ConfigSourceError::LocatorUnavailable { locator });
            }
            None => {
                warn!(%locator, "INI object not found, source will return no values");
                IniDocument::default()
            }
        };

        info!(
            %locator,
            sections = document.section_count(),
            "Loaded INI configuration object"
        );

        Ok(Self {
            locator,
            resolver,
            document,
        })
    }

    /// Create against S3 using the given AWS client settings.
    pub async fn from_aws(config: IniObjectConfig, client: &AwsClientConfig) -> Result<Self> {
        config.validate()?;
        let store = S3ObjectStore::from_config(client).await;
        Self::new(&store, config).await
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn document(&self) -> &IniDocument {
        &self.document
    }
}

#[async_trait]
impl ConfigSource for IniObjectSource {
    fn name(&self) -> &str {
        "s3-ini"
    }

    async fn get_config_value(&self, section: &str, key: &str) -> Result<Option<String>> {
        self.resolver
            .resolve(section, key, |key| {
                let value = self
                    .document
                    .get(key.section(), key.key())
                    .map(str::to_string);
                async move { Ok(value) }
            })
            .await
    }
}
