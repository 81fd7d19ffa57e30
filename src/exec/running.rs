// src/exec/running.rs

//! Handle to a submitted operation and its one-shot completion.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::OperationError;
use crate::state::State;
use crate::types::OperationType;

static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(u64);

impl OperationId {
    pub fn next() -> Self {
        Self(NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

/// Lifecycle position of an operation as seen through its handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Running,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, OperationStatus::Running)
    }
}

/// Result fields of a finished operation.
///
/// Published as a single immutable value, so `err`, `plan_empty` and `state`
/// are always observed together. `err` is authoritative: a present `state`
/// says nothing about success.
#[derive(Debug)]
pub struct OperationOutcome {
    pub err: Option<OperationError>,
    /// Only meaningful after a successful plan-producing operation.
    pub plan_empty: bool,
    pub state: Option<State>,
}

impl OperationOutcome {
    pub fn success(state: Option<State>) -> Self {
        Self {
            err: None,
            plan_empty: false,
            state,
        }
    }

    pub fn planned(state: Option<State>, plan_empty: bool) -> Self {
        Self {
            err: None,
            plan_empty,
            state,
        }
    }

    pub fn failed(err: impl Into<OperationError>, state: Option<State>) -> Self {
        Self {
            err: Some(err.into()),
            plan_empty: false,
            state,
        }
    }

    pub fn canceled(state: Option<State>) -> Self {
        Self::failed(OperationError::Canceled, state)
    }

    pub(crate) fn abandoned() -> Self {
        Self::failed(OperationError::Abandoned, None)
    }

    pub fn status(&self) -> OperationStatus {
        match self.err {
            None => OperationStatus::Succeeded,
            Some(OperationError::Canceled) => OperationStatus::Canceled,
            Some(_) => OperationStatus::Failed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.err.is_none()
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.err, Some(OperationError::Canceled))
    }
}

type Slot = Option<Arc<OperationOutcome>>;

/// Handle returned by [`Enhanced::operation`](crate::backend::Enhanced::operation).
///
/// Completion is signalled only by the backend, through the paired
/// [`Completer`]. It does not depend on the cancellation token the caller
/// passed in: cancelling that token asks the backend to stop, and the handle
/// completes once the backend has actually stopped and published its
/// outcome.
///
/// Handles are cheap to clone; every clone observes the same completion.
#[derive(Clone)]
pub struct RunningOperation {
    id: OperationId,
    op_type: OperationType,
    done: watch::Receiver<Slot>,
}

impl fmt::Debug for RunningOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningOperation")
            .field("id", &self.id)
            .field("op_type", &self.op_type)
            .field("status", &self.status())
            .finish()
    }
}

impl RunningOperation {
    /// Create a handle in the running state together with the completer that
    /// will finish it.
    pub fn pending(op_type: OperationType) -> (RunningOperation, Completer) {
        let id = OperationId::next();
        let (tx, rx) = watch::channel(None);
        let handle = RunningOperation {
            id,
            op_type,
            done: rx,
        };
        let completer = Completer { id, tx: Some(tx) };
        (handle, completer)
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn op_type(&self) -> OperationType {
        self.op_type
    }

    pub fn is_done(&self) -> bool {
        self.done.borrow().is_some()
    }

    pub fn status(&self) -> OperationStatus {
        self.done
            .borrow()
            .as_ref()
            .map_or(OperationStatus::Running, |outcome| outcome.status())
    }

    /// The outcome if the operation has completed, without waiting.
    pub fn try_outcome(&self) -> Option<Arc<OperationOutcome>> {
        self.done.borrow().clone()
    }

    /// Wait for completion and return the outcome.
    pub async fn wait(&self) -> Arc<OperationOutcome> {
        let mut rx = self.done.clone();
        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|slot| slot.clone());

        // The completer publishes before its sender goes away, so a closed
        // channel without a value cannot be observed here.
        outcome.unwrap_or_else(|| Arc::new(OperationOutcome::abandoned()))
    }
}

/// Write side of a [`RunningOperation`].
///
/// `complete` consumes the completer, so an operation completes at most
/// once. Dropping it without completing publishes an
/// [`OperationError::Abandoned`] outcome, so waiters are never left hanging.
pub struct Completer {
    id: OperationId,
    tx: Option<watch::Sender<Slot>>,
}

impl fmt::Debug for Completer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completer").field("id", &self.id).finish()
    }
}

impl Completer {
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Publish the outcome and signal completion.
    pub fn complete(mut self, outcome: OperationOutcome) {
        if let Some(tx) = self.tx.take() {
            debug!(id = %self.id, status = ?outcome.status(), "operation completed");
            tx.send_replace(Some(Arc::new(outcome)));
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(id = %self.id, "operation completer dropped without an outcome");
            tx.send_replace(Some(Arc::new(OperationOutcome::abandoned())));
        }
    }
}
