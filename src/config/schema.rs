// src/config/schema.rs

//! Declarative description of the options a backend accepts.
//!
//! Backends build a [`ConfigSchema`] once and delegate the bulk of
//! `input`, `validate` and `configure` to it:
//! - [`ConfigSchema::input`] prompts for required options that are missing.
//! - [`ConfigSchema::validate`] collects every problem in a single pass.
//! - [`ConfigSchema::check_supported`] rejects options the backend does not
//!   know, naming the option.

use tracing::debug;

use crate::config::model::BackendConfig;
use crate::errors::ConfigError;
use crate::types::ValueKind;
use crate::ui::{InputRequest, UiInput};
use crate::value::Value;

/// Extra per-option check run after the type check passes.
pub type ValueCheck = fn(&Value) -> Result<(), String>;

/// One configuration option.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub kind: ValueKind,
    pub required: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// If set, using this option produces a warning with this message.
    pub deprecated: Option<String>,
    pub check: Option<ValueCheck>,
}

impl Attribute {
    pub fn required(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, kind, true)
    }

    pub fn optional(name: impl Into<String>, kind: ValueKind) -> Self {
        Self::new(name, kind, false)
    }

    fn new(name: impl Into<String>, kind: ValueKind, required: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            required,
            default: None,
            description: None,
            deprecated: None,
            check: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    pub fn with_check(mut self, check: ValueCheck) -> Self {
        self.check = Some(check);
        self
    }

    /// Required and without a default: the user has to supply it.
    fn needs_value(&self) -> bool {
        self.required && self.default.is_none()
    }
}

/// Result of validating a configuration: all warnings and all errors.
///
/// Warnings never block configuration; see [`Diagnostics::is_configurable`].
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub warnings: Vec<String>,
    pub errors: Vec<ConfigError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn error(&mut self, error: ConfigError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
        self.errors.extend(other.errors);
    }

    /// `true` when there are no errors, regardless of warnings.
    pub fn is_configurable(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

/// Ordered set of [`Attribute`]s.
#[derive(Debug, Clone, Default)]
pub struct ConfigSchema {
    attributes: Vec<Attribute>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute, replacing any earlier one with the same name.
    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.retain(|a| a.name != attribute.name);
        self.attributes.push(attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    /// Check `config` against the schema, collecting every warning and error.
    ///
    /// Pure: does not touch the UI or any backend state.
    pub fn validate(&self, config: &BackendConfig) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for (key, value) in config.iter() {
            let Some(attr) = self.get(key) else {
                diags.error(ConfigError::Unsupported {
                    key: key.to_string(),
                });
                continue;
            };

            if value.kind() != attr.kind {
                diags.error(ConfigError::TypeMismatch {
                    key: key.to_string(),
                    expected: attr.kind,
                    found: value.kind(),
                });
                continue;
            }

            if let Some(check) = attr.check {
                if let Err(reason) = check(value) {
                    diags.error(ConfigError::InvalidValue {
                        key: key.to_string(),
                        reason,
                    });
                }
            }

            if let Some(ref message) = attr.deprecated {
                diags.warn(format!(
                    "configuration option '{key}' is deprecated: {message}"
                ));
            }
        }

        for attr in self.attributes.iter() {
            if attr.needs_value() && !config.contains_key(&attr.name) {
                diags.error(ConfigError::MissingRequired {
                    key: attr.name.clone(),
                });
            }
        }

        debug!(
            warnings = diags.warnings.len(),
            errors = diags.errors.len(),
            "validated backend configuration"
        );
        diags
    }

    /// Fail on the first option the schema does not know, naming it.
    pub fn check_supported(&self, config: &BackendConfig) -> Result<(), ConfigError> {
        match config.keys().find(|key| self.get(key).is_none()) {
            Some(key) => Err(ConfigError::Unsupported {
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Fill in defaults for options that are not set.
    pub fn apply_defaults(&self, config: &BackendConfig) -> BackendConfig {
        let mut out = config.clone();
        for attr in self.attributes.iter() {
            if let Some(ref default) = attr.default {
                if !out.contains_key(&attr.name) {
                    out.insert(attr.name.clone(), default.clone());
                }
            }
        }
        out
    }

    /// Prompt for every required option that has no value and no default.
    ///
    /// A declined or empty answer is reported as
    /// [`ConfigError::MissingRequired`] right away, so a non-interactive
    /// input never blocks.
    pub fn input(
        &self,
        ui: &dyn UiInput,
        config: BackendConfig,
    ) -> Result<BackendConfig, ConfigError> {
        let mut config = config;

        for attr in self.attributes.iter() {
            if !attr.needs_value() || config.contains_key(&attr.name) {
                continue;
            }

            let mut request = InputRequest::new(
                format!("backend.{}", attr.name),
                format!("Value for '{}'", attr.name),
            );
            if let Some(ref description) = attr.description {
                request = request.with_description(description.clone());
            }

            let answer = ui.input(&request).map_err(|source| ConfigError::Input {
                key: attr.name.clone(),
                source,
            })?;

            let raw = match answer {
                Some(raw) if !raw.trim().is_empty() => raw,
                _ => {
                    return Err(ConfigError::MissingRequired {
                        key: attr.name.clone(),
                    });
                }
            };

            let value = Value::parse_as(attr.kind, &raw).map_err(|reason| {
                ConfigError::InvalidValue {
                    key: attr.name.clone(),
                    reason,
                }
            })?;
            debug!(key = %attr.name, "configuration option supplied via input");
            config.insert(attr.name.clone(), value);
        }

        Ok(config)
    }
}
