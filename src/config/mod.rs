// src/config/mod.rs

//! Backend configuration.
//!
//! Responsibilities:
//! - Define the raw option map and the TOML settings file (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate the settings file (`validate.rs`).
//! - Describe and check the options a backend accepts (`schema.rs`).

pub mod loader;
pub mod model;
pub mod schema;
pub mod validate;

pub use loader::{default_settings_path, load_and_validate, load_from_path, parse_settings};
pub use model::{BackendConfig, BackendSection, RawSettingsFile, SettingsFile};
pub use schema::{Attribute, ConfigSchema, Diagnostics, ValueCheck};
