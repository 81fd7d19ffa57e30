// src/engine/mod.rs

//! Caller side of the backend contract.
//!
//! Probes a backend for the capability it needs, submits the operation,
//! waits on the handle and wires Ctrl-C to cancellation. The caller never
//! needs to know whether the backend runs the work locally or remotely.

pub mod runner;

pub use runner::{local_context, run_operation, run_until_interrupted, submit};
