// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettingsFile, SettingsFile};
use crate::errors::ConfigError;

/// Parse settings from a TOML string without semantic validation.
pub fn parse_settings(contents: &str) -> Result<RawSettingsFile, ConfigError> {
    let settings: RawSettingsFile = toml::from_str(contents)?;
    Ok(settings)
}

/// Load a settings file from a given path and return the raw `RawSettingsFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to also
/// check the backend section.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettingsFile, ConfigError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading backend settings");
    let contents = fs::read_to_string(path)?;
    parse_settings(&contents)
}

/// Load a settings file from path and run basic validation.
///
/// This is the recommended entry point: it reads TOML, applies serde
/// defaults, and checks that a usable backend type is named. Option-level
/// checks are left to the selected backend's `validate`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<SettingsFile, ConfigError> {
    let raw = load_from_path(&path)?;
    SettingsFile::try_from(raw)
}

/// Default settings location: `backend.toml` in the current directory.
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("backend.toml")
}
