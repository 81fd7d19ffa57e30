// src/operation/variables.rs

//! Operation variables and variable files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::errors::ConfigError;
use crate::value::Value;

/// Variable name -> value. Keys are unique by construction.
pub type Variables = BTreeMap<String, Value>;

/// Load a TOML variable file where every top-level key is a variable.
///
/// ```toml
/// region = "eu-west-1"
/// replicas = 3
/// tags = { team = "infra" }
/// ```
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Variables, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let vars: Variables = toml::from_str(&contents)?;
    debug!(path = %path.display(), count = vars.len(), "loaded variable file");
    Ok(vars)
}

/// Layer `overrides` on top of `base`; later values win per key.
///
/// Maps are replaced wholesale, not merged key by key.
pub fn merge(base: &Variables, overrides: &Variables) -> Variables {
    let mut out = base.clone();
    for (name, value) in overrides {
        out.insert(name.clone(), value.clone());
    }
    out
}

/// Load several variable files in order and merge them.
pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Variables, ConfigError> {
    let mut vars = Variables::new();
    for path in paths {
        let next = load_from_path(path)?;
        vars = merge(&vars, &next);
    }
    Ok(vars)
}
