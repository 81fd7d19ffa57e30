// src/exec/mod.rs

//! Asynchronous execution contract.
//!
//! - [`running`] defines the [`RunningOperation`] handle, its one-shot
//!   [`Completer`] and the [`OperationOutcome`] published on completion.
//! - [`spawn`] provides [`spawn_operation`], which backends use to run an
//!   operation's work on Tokio without blocking submission.
//!
//! Ordering: the outcome is written in full before completion becomes
//! observable, and is never modified afterwards.

pub mod running;
pub mod spawn;

pub use running::{Completer, OperationId, OperationOutcome, OperationStatus, RunningOperation};
pub use spawn::{spawn_operation, OperationRun};
