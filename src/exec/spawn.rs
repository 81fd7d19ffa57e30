// src/exec/spawn.rs

//! Helper for backends: run an operation's work on Tokio and complete its
//! handle when the work is done.

use std::future::Future;

use anyhow::anyhow;
use tokio::runtime::Handle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::errors::{OperationError, SubmitError};
use crate::exec::running::{OperationId, OperationOutcome, OperationStatus, RunningOperation};
use crate::operation::Operation;

/// What the work of a spawned operation receives.
///
/// The cancellation token is the one the caller passed to `operation`; the
/// work polls it and decides how to stop. It has no influence on when the
/// handle completes.
#[derive(Debug)]
pub struct OperationRun {
    pub id: OperationId,
    pub operation: Operation,
    cancel: CancellationToken,
}

impl OperationRun {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Canceled)` if cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), OperationError> {
        if self.is_cancelled() {
            Err(OperationError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Drive `fut` until it finishes or cancellation is requested.
    ///
    /// Returns `None` on cancellation; `fut` is dropped at that point, so
    /// cleanup of partial work is the caller's job.
    pub async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    pub fn output(&self, line: &str) {
        self.operation.output(line);
    }
}

/// Spawn `work` for `operation` and return its handle immediately.
///
/// The handle completes with whatever outcome `work` returns. If `work`
/// panics, the handle completes with an execution error instead.
///
/// Fails only if called outside a Tokio runtime.
pub fn spawn_operation<F, Fut>(
    cancel: CancellationToken,
    operation: Operation,
    work: F,
) -> Result<RunningOperation, SubmitError>
where
    F: FnOnce(OperationRun) -> Fut + Send + 'static,
    Fut: Future<Output = OperationOutcome> + Send + 'static,
{
    let runtime = Handle::try_current().map_err(|_| SubmitError::NoRuntime)?;

    let op_type = operation.op_type;
    let (running, completer) = RunningOperation::pending(op_type);
    let id = running.id();
    let run = OperationRun {
        id,
        operation,
        cancel,
    };

    info!(%id, %op_type, "operation submitted");

    let inner = runtime.clone();
    runtime.spawn(async move {
        // Run the work in its own task so a panic surfaces as a JoinError
        // instead of taking the completer down with it.
        let outcome = match inner.spawn(work(run)).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%id, error = %err, "operation work did not finish");
                OperationOutcome::failed(
                    OperationError::Execution(anyhow!("operation task failed: {err}")),
                    None,
                )
            }
        };

        match outcome.status() {
            OperationStatus::Canceled => info!(%id, %op_type, "operation canceled"),
            OperationStatus::Failed => info!(%id, %op_type, "operation failed"),
            _ => debug!(%id, %op_type, plan_empty = outcome.plan_empty, "operation succeeded"),
        }

        completer.complete(outcome);
    });

    Ok(running)
}
