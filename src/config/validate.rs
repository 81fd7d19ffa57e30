// src/config/validate.rs

use crate::config::model::{RawSettingsFile, SettingsFile};
use crate::errors::ConfigError;

impl TryFrom<RawSettingsFile> for SettingsFile {
    type Error = ConfigError;

    fn try_from(raw: RawSettingsFile) -> Result<Self, Self::Error> {
        validate_backend_type(&raw.backend.backend_type)?;
        validate_variable_names(&raw)?;
        Ok(SettingsFile::new_unchecked(raw.backend, raw.variables))
    }
}

fn validate_backend_type(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "[backend].type must name a backend (got an empty string)".to_string(),
        ));
    }

    if !is_identifier(name) {
        return Err(ConfigError::Invalid(format!(
            "[backend].type '{name}' must contain only lowercase letters, digits, '-' or '_'"
        )));
    }

    Ok(())
}

fn validate_variable_names(raw: &RawSettingsFile) -> Result<(), ConfigError> {
    for name in raw.variables.keys() {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid(format!(
                "[variables] contains an invalid variable name {name:?}"
            )));
        }
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}
