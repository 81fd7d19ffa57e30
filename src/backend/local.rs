// src/backend/local.rs

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;

use crate::operation::ResourceAddress;
use crate::plan::Plan;
use crate::state::{State, StateStore};

/// Synchronous graph-execution engine bound to one module and state.
///
/// Produced by [`Local::context`](super::Local::context) for callers that
/// drive the engine directly.
pub trait ExecutionContext: Send + Debug {
    fn validate(&self) -> Result<()>;
    fn refresh(&mut self) -> Result<State>;
    fn plan(&mut self) -> Result<Arc<dyn Plan>>;
    fn apply(&mut self) -> Result<State>;
    fn import(&mut self, targets: &[ResourceAddress]) -> Result<State>;
}

/// Execution context plus the state store it reads from and writes to.
#[derive(Debug)]
pub struct LocalContext {
    pub context: Box<dyn ExecutionContext>,
    pub state: Arc<dyn StateStore>,
}
