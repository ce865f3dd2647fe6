//! Case-insensitive configuration keys and the `only_these_keys` allow-list

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A `(section, key)` pair. Both parts are lowercased on construction, so two
/// keys that differ only in case are the same identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct ConfigKey {
    section: String,
    key: String,
}

impl ConfigKey {
    pub fn new(section: impl AsRef<str>, key: impl AsRef<str>) -> Self {
        Self {
            section: normalize(section.as_ref()),
            key: normalize(key.as_ref()),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.section, self.key)
    }
}

impl<S: AsRef<str>, K: AsRef<str>> From<(S, K)> for ConfigKey {
    fn from((section, key): (S, K)) -> Self {
        ConfigKey::new(section, key)
    }
}

impl From<ConfigKey> for (String, String) {
    fn from(key: ConfigKey) -> Self {
        (key.section, key.key)
    }
}

/// Canonical case for section and key identifiers.
pub fn normalize(identifier: &str) -> String {
    identifier.to_lowercase()
}

/// Optional allow-list restricting which keys a source will ever resolve.
///
/// `None` allows everything. An empty set allows nothing. Entries are
/// normalized when the filter is built, so the configured set may use any case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    allowed: Option<HashSet<ConfigKey>>,
}

impl KeyFilter {
    pub fn allow_all() -> Self {
        Self { allowed: None }
    }

    pub fn only<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<ConfigKey>,
    {
        Self {
            allowed: Some(keys.into_iter().map(Into::into).collect()),
        }
    }

    pub fn allows(&self, key: &ConfigKey) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(key))
    }

    /// The configured key set, if the filter restricts anything.
    pub fn keys(&self) -> Option<&HashSet<ConfigKey>> {
        self.allowed.as_ref()
    }

    pub fn is_restricted(&self) -> bool {
        self.allowed.is_some()
    }
}

impl From<Option<HashSet<ConfigKey>>> for KeyFilter {
    fn from(allowed: Option<HashSet<ConfigKey>>) -> Self {
        match allowed {
            Some(keys) => KeyFilter::only(keys),
            None => KeyFilter::allow_all(),
        }
    }
}
