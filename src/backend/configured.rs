// src/backend/configured.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::BackendConfig;
use crate::errors::ConfigError;
use crate::value::Value;

/// Holds whatever a backend builds from its configuration, and enforces
/// that configuration happens once.
///
/// Re-applying the same configuration is accepted and does nothing;
/// applying a different one fails with [`ConfigError::AlreadyConfigured`]
/// naming the first option that differs.
#[derive(Debug)]
pub struct ConfigureOnce<T> {
    slot: Option<(BackendConfig, T)>,
}

impl<T> Default for ConfigureOnce<T> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<T> ConfigureOnce<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `build` on first use and keep its result.
    pub fn configure_with<F>(&mut self, config: &BackendConfig, build: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&BackendConfig) -> Result<T, ConfigError>,
    {
        if let Some((ref applied, _)) = self.slot {
            return match first_difference(applied, config) {
                None => {
                    debug!("backend already configured with identical options");
                    Ok(())
                }
                Some(key) => Err(ConfigError::AlreadyConfigured { key }),
            };
        }

        let value = build(config)?;
        self.slot = Some((config.clone(), value));
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.slot.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.slot.as_ref().map(|(_, value)| value)
    }

    /// The configuration that was applied.
    pub fn config(&self) -> Option<&BackendConfig> {
        self.slot.as_ref().map(|(config, _)| config)
    }
}

fn first_difference(a: &BackendConfig, b: &BackendConfig) -> Option<String> {
    let keys: BTreeSet<&str> = a.keys().chain(b.keys()).collect();
    keys.into_iter()
        .find(|key| match (a.get(key), b.get(key)) {
            (Some(x), Some(y)) => !same_value(x, y),
            (x, y) => x.is_some() != y.is_some(),
        })
        .map(str::to_string)
}

/// Structural equality where numbers compare by bit pattern, so an option
/// set to NaN still equals itself.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.to_bits() == y.to_bits(),
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Map(xs), Value::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, x), (ky, y))| kx == ky && same_value(x, y))
        }
        _ => a == b,
    }
}
