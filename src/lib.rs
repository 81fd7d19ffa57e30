// src/lib.rs

//! Pluggable execution backends for infrastructure operations.
//!
//! The same caller code drives plan / apply / refresh / import / destroy
//! whether the backend runs them in-process or on a remote service:
//!
//! - [`backend`]: the [`Backend`] contract, the optional [`Enhanced`] and
//!   [`Local`] capabilities, configure-once helper and backend registry.
//! - [`operation`]: the [`Operation`] descriptor and submission checks.
//! - [`exec`]: the [`RunningOperation`] handle and its completion contract.
//! - [`engine`]: caller-side helpers that submit, wait and cancel.
//! - [`config`]: backend configuration, settings files and option schemas.
//!
//! State storage, module loading, plan computation and UI rendering are
//! external; this crate only defines the interfaces it consumes
//! ([`state`], [`module`], [`plan`], [`ui`]).

pub mod backend;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod module;
pub mod operation;
pub mod plan;
pub mod state;
pub mod types;
pub mod ui;
pub mod value;

pub use backend::{Backend, Capabilities, Enhanced, Local};
pub use errors::{BackendError, ConfigError, OperationError, Result, SubmitError};
pub use exec::{OperationOutcome, RunningOperation};
pub use operation::Operation;
pub use types::{OperationField, OperationType};
pub use value::Value;

pub use tokio_util::sync::CancellationToken;
