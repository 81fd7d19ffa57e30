// src/backend/mod.rs

//! Pluggable backend abstraction.
//!
//! Every backend implements [`Backend`]. Two optional capabilities sit on
//! top of it, independently of each other:
//! - [`Enhanced`]: the backend can run operations itself (locally or on a
//!   remote service).
//! - [`Local`]: the backend can hand out a local execution context for
//!   callers that need direct access (console, import, graph).
//!
//! Callers probe for them with [`Backend::as_enhanced`] and
//! [`Backend::as_local`]; a backend that lacks a capability simply keeps
//! the default `None`, with no stub methods to write.

pub mod configured;
pub mod local;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

pub use configured::ConfigureOnce;
pub use local::{ExecutionContext, LocalContext};
pub use registry::{init_backend, BackendFactory, BackendRegistry};

use crate::config::{BackendConfig, Diagnostics};
use crate::errors::{BackendError, ConfigError, SubmitError};
use crate::exec::RunningOperation;
use crate::operation::Operation;
use crate::state::StateStore;
use crate::ui::UiInput;

/// Minimal contract every backend satisfies.
pub trait Backend: Send + Sync {
    /// Ask for any required configuration that is missing.
    ///
    /// With an input that declines prompts, unresolved required options are
    /// reported as errors instead of waiting.
    fn input(&self, ui: &dyn UiInput, config: BackendConfig)
        -> Result<BackendConfig, ConfigError>;

    /// Check `config` without side effects, returning every warning and
    /// every error found.
    fn validate(&self, config: &BackendConfig) -> Diagnostics;

    /// Apply a validated configuration.
    ///
    /// Unsupported options are named in the error. A second call with the
    /// same configuration is a no-op; a conflicting one is rejected.
    fn configure(&mut self, config: &BackendConfig) -> Result<(), ConfigError>;

    /// Handle to this backend's state store. The state is not loaded.
    fn state(&self) -> Result<Arc<dyn StateStore>, BackendError>;

    fn as_enhanced(&self) -> Option<&dyn Enhanced> {
        None
    }

    fn as_local(&self) -> Option<&dyn Local> {
        None
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            enhanced: self.as_enhanced().is_some(),
            local: self.as_local().is_some(),
        }
    }
}

/// A backend that runs operations.
pub trait Enhanced: Backend {
    /// Submit `operation` and return without waiting for it to run.
    ///
    /// Errors are for submission problems only (unsupported type, fields
    /// the type does not accept, missing module, ...). How the operation
    /// itself ends is reported on the returned handle.
    ///
    /// `cancel` requests cancellation. The handle completes only once the
    /// backend has stopped and published its outcome.
    fn operation(
        &self,
        cancel: CancellationToken,
        operation: Operation,
    ) -> Result<RunningOperation, SubmitError>;
}

/// A backend that can materialise a local execution context.
pub trait Local: Backend {
    /// Build an execution context for `operation`.
    ///
    /// The operation type is not used; `module` (or a plan carrying one)
    /// and the other options are.
    fn context(&self, operation: &Operation) -> Result<LocalContext, BackendError>;
}

/// Which optional capabilities a backend has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub enhanced: bool,
    pub local: bool,
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.enhanced, self.local) {
            (true, true) => f.write_str("enhanced, local"),
            (true, false) => f.write_str("enhanced"),
            (false, true) => f.write_str("local"),
            (false, false) => f.write_str("basic"),
        }
    }
}
