// src/engine/runner.rs

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Enhanced, LocalContext};
use crate::errors::{BackendError, Result};
use crate::exec::{OperationOutcome, RunningOperation};
use crate::operation::Operation;

/// Submit `operation` to an enhanced backend.
///
/// Returns as soon as the backend has accepted (or rejected) it.
pub fn submit(
    backend: &dyn Enhanced,
    operation: Operation,
    cancel: CancellationToken,
) -> Result<RunningOperation> {
    let op_type = operation.op_type;
    let handle = backend.operation(cancel, operation)?;
    debug!(id = %handle.id(), %op_type, "operation accepted by backend");
    Ok(handle)
}

/// Run `operation` on `backend` and wait for its outcome.
///
/// Fails with [`BackendError::Unsupported`] if the backend cannot run
/// operations, and with [`BackendError::Submit`] if it rejects this one.
/// Anything that goes wrong while running is in the outcome's `err`.
pub async fn run_operation(
    backend: &dyn Backend,
    operation: Operation,
    cancel: CancellationToken,
) -> Result<Arc<OperationOutcome>> {
    let enhanced = backend
        .as_enhanced()
        .ok_or(BackendError::Unsupported("running operations"))?;

    let handle = submit(enhanced, operation, cancel)?;
    let outcome = handle.wait().await;

    info!(id = %handle.id(), status = ?outcome.status(), "operation finished");
    Ok(outcome)
}

/// Like [`run_operation`], but Ctrl-C requests cancellation.
///
/// After an interrupt this still waits for the backend to finish cleaning
/// up, so the returned outcome is always complete.
pub async fn run_until_interrupted(
    backend: &dyn Backend,
    operation: Operation,
) -> Result<Arc<OperationOutcome>> {
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupt received; asking the backend to stop");
            cancel.cancel();
        })
    };

    let result = run_operation(backend, operation, cancel).await;
    interrupt.abort();
    result
}

/// Get a local execution context from `backend`.
pub fn local_context(backend: &dyn Backend, operation: &Operation) -> Result<LocalContext> {
    let local = backend
        .as_local()
        .ok_or(BackendError::Unsupported("local execution contexts"))?;
    local.context(operation)
}
