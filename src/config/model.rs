// src/config/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::operation::Variables;
use crate::value::Value;

/// Raw backend configuration: option name -> value.
///
/// This is what `input`, `validate` and `configure` operate on. It carries
/// no schema; each backend checks it against its own [`ConfigSchema`].
///
/// [`ConfigSchema`]: crate::config::ConfigSchema
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendConfig {
    values: BTreeMap<String, Value>,
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for BackendConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Settings file as read from TOML, before validation.
///
/// ```toml
/// [backend]
/// type = "memory"
///
/// [backend.config]
/// lineage = "prod"
///
/// [variables]
/// region = "eu-west-1"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawSettingsFile {
    pub backend: BackendSection,

    /// Default operation variables.
    #[serde(default)]
    pub variables: Variables,
}

/// `[backend]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendSection {
    /// Registry name of the backend to use.
    #[serde(rename = "type")]
    pub backend_type: String,

    /// Options passed to the backend's `input`/`validate`/`configure`.
    #[serde(default)]
    pub config: BackendConfig,
}

/// Validated settings file.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    backend: BackendSection,
    variables: Variables,
}

impl SettingsFile {
    pub(crate) fn new_unchecked(backend: BackendSection, variables: Variables) -> Self {
        Self { backend, variables }
    }

    pub fn backend_type(&self) -> &str {
        &self.backend.backend_type
    }

    pub fn backend_config(&self) -> &BackendConfig {
        &self.backend.config
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }
}
