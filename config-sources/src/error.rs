//! Error types for configuration sources

use thiserror::Error;

/// Boxed error raised by a backend client (SDK, HTTP, auth).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ConfigSourceError {
    /// The backend resource itself (bucket, object, table, secret prefix,
    /// parameter prefix) does not exist. Only raised at construction when
    /// `must_exist` is set.
    #[error("Configuration locator unavailable: {locator}")]
    LocatorUnavailable { locator: String },

    /// A specific `(section, key)` has no value and `must_exist` is set.
    #[error("Configuration key not found: [{section}] {key}")]
    KeyNotFound { section: String, key: String },

    #[error("Malformed configuration data at {locator}: {reason}")]
    MalformedData { locator: String, reason: String },

    /// Failure reported by the underlying client, passed through untouched.
    #[error("{operation} failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ConfigSourceError {
    pub fn transport<E>(operation: &'static str, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        ConfigSourceError::Transport {
            operation,
            source: source.into(),
        }
    }

    pub fn malformed(locator: impl Into<String>, reason: impl ToString) -> Self {
        ConfigSourceError::MalformedData {
            locator: locator.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_key_not_found(&self) -> bool {
        matches!(self, ConfigSourceError::KeyNotFound { .. })
    }

    pub fn is_locator_unavailable(&self) -> bool {
        matches!(self, ConfigSourceError::LocatorUnavailable { .. })
    }
}
