// src/plan.rs

//! Precomputed plans and the backend description stored alongside them.

use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::module::ModuleTree;

/// A precomputed description of the changes an apply would make.
///
/// How the plan is computed or encoded is up to the execution engine.
pub trait Plan: Send + Sync + Debug {
    /// `true` if applying this plan would change nothing.
    fn is_empty(&self) -> bool;

    /// Module tree the plan was computed from, if the plan carries it.
    fn module(&self) -> Option<Arc<dyn ModuleTree>>;
}

/// Backend recorded with a saved plan, so a later apply uses the same one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendState {
    #[serde(rename = "type")]
    pub backend_type: String,
    #[serde(default)]
    pub config: BackendConfig,
}

impl BackendState {
    pub fn new(backend_type: impl Into<String>, config: BackendConfig) -> Self {
        Self {
            backend_type: backend_type.into(),
            config,
        }
    }
}
