mod common;
use crate::common::builders::{web_module, FakePlan};
use crate::common::fake_backend::FakeBackend;
use crate::common::ui::RecordingOutput;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use infra_backend::engine::{run_operation, submit};
use infra_backend::exec::{spawn_operation, OperationOutcome, OperationStatus, RunningOperation};
use infra_backend::operation::ResourceAddress;
use infra_backend::state::StateStore;
use infra_backend::{CancellationToken, Enhanced, Operation, OperationError, OperationType};

type TestResult = Result<(), Box<dyn Error>>;

fn plan_op() -> Operation {
    Operation::new(OperationType::Plan).with_module(web_module())
}

fn apply_op() -> Operation {
    Operation::new(OperationType::Apply).with_module(web_module())
}

#[tokio::test]
async fn submission_returns_before_the_operation_finishes() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("lifecycle");
    let control = backend.control();
    control.hold();

    let handle = backend.operation(CancellationToken::new(), plan_op())?;
    assert_eq!(handle.op_type(), OperationType::Plan);
    assert!(!handle.is_done());
    assert_eq!(handle.status(), OperationStatus::Running);
    assert!(!handle.status().is_terminal());
    assert!(handle.try_outcome().is_none());

    with_timeout(control.wait_started()).await;
    assert!(!handle.is_done(), "held operation must still be running");

    control.release();
    let outcome = with_timeout(handle.wait()).await;

    assert!(outcome.is_success());
    assert_eq!(handle.status(), OperationStatus::Succeeded);
    assert!(handle.status().is_terminal());
    Ok(())
}

#[tokio::test]
async fn plan_on_empty_state_reports_changes() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("plan");
    let store = backend.store().ok_or("configured backend has a store")?;

    let handle = backend.operation(CancellationToken::new(), plan_op().with_plan_refresh(true))?;
    let outcome = with_timeout(handle.wait()).await;

    assert!(outcome.err.is_none(), "unexpected error: {:?}", outcome.err);
    assert!(!outcome.plan_empty);
    let state = outcome.state.as_ref().ok_or("plan should report the refreshed state")?;
    assert!(state.is_empty());
    assert_eq!(state.lineage, "plan");
    assert_eq!(store.persisted().as_ref(), Some(state));
    assert_eq!(store.persist_count(), 0, "plan must not persist anything");
    Ok(())
}

#[tokio::test]
async fn plan_after_apply_is_empty() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("converged");

    let applied = with_timeout(backend.operation(CancellationToken::new(), apply_op())?.wait()).await;
    assert!(applied.is_success());

    let planned = with_timeout(
        backend
            .operation(CancellationToken::new(), plan_op().with_plan_refresh(true))?
            .wait(),
    )
    .await;

    assert!(planned.is_success());
    assert!(planned.plan_empty);
    Ok(())
}

#[tokio::test]
async fn apply_writes_and_persists_state() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("apply");
    let store = backend.store().ok_or("configured backend has a store")?;

    let outcome = with_timeout(backend.operation(CancellationToken::new(), apply_op())?.wait()).await;

    assert!(outcome.is_success());
    let state = outcome.state.as_ref().ok_or("apply reports the new state")?;
    assert_eq!(state.serial, 1);
    assert!(state.resource("aws_instance.web").is_some());
    assert!(state.resource("aws_security_group.web").is_some());

    assert_eq!(store.persisted().as_ref(), Some(state));
    assert_eq!(store.persist_count(), 1);
    assert!(!store.is_locked());
    Ok(())
}

#[tokio::test]
async fn apply_of_an_empty_plan_changes_nothing() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("empty-plan");
    let store = backend.store().ok_or("configured backend has a store")?;
    let plan = FakePlan::new(true).with_module(web_module()).build();

    let op = Operation::new(OperationType::Apply).with_plan(plan);
    let outcome = with_timeout(backend.operation(CancellationToken::new(), op)?.wait()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.state.as_ref().map(|s| s.serial), Some(0));
    assert_eq!(store.persisted().map(|s| s.resources.len()), Some(0));
    Ok(())
}

#[tokio::test]
async fn targeted_destroy_only_removes_the_target() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("destroy");
    with_timeout(backend.operation(CancellationToken::new(), apply_op())?.wait()).await;

    let op = Operation::new(OperationType::Destroy)
        .with_module(web_module())
        .with_target(ResourceAddress::parse("aws_instance.web")?);
    let outcome = with_timeout(backend.operation(CancellationToken::new(), op)?.wait()).await;

    assert!(outcome.is_success());
    let state = outcome.state.as_ref().ok_or("destroy reports the new state")?;
    assert!(state.resource("aws_instance.web").is_none());
    assert!(state.resource("aws_security_group.web").is_some());
    assert_eq!(state.serial, 2);
    Ok(())
}

#[tokio::test]
async fn import_records_the_targets() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("import");
    let op = Operation::new(OperationType::Import)
        .with_module(web_module())
        .with_target(ResourceAddress::parse("aws_instance.web")?);

    let outcome = run_operation(&backend, op, CancellationToken::new()).await?;

    assert!(outcome.is_success());
    let state = outcome.state.as_ref().ok_or("import reports the new state")?;
    assert_eq!(state.resources.len(), 1);
    assert!(state.resource("aws_instance.web").is_some());
    Ok(())
}

#[tokio::test]
async fn refresh_loads_the_persisted_state() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("refresh");
    let store = backend.store().ok_or("configured backend has a store")?;
    with_timeout(backend.operation(CancellationToken::new(), apply_op())?.wait()).await;

    // Local edits that were never persisted are dropped by a refresh.
    store.write_state(infra_backend::state::State::new("scratch"))?;

    let op = Operation::new(OperationType::Refresh).with_module(web_module());
    let outcome = run_operation(&backend, op, CancellationToken::new()).await?;

    assert!(outcome.is_success());
    assert_eq!(outcome.state, store.persisted());
    assert_eq!(outcome.state.as_ref().map(|s| s.lineage.as_str()), Some("refresh"));
    Ok(())
}

#[tokio::test]
async fn cancel_completes_only_after_cleanup() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("cancel");
    let store = backend.store().ok_or("configured backend has a store")?;
    let control = backend.control();
    control.hold();
    control.set_cleanup_delay(Duration::from_millis(200));

    let cancel = CancellationToken::new();
    let handle = backend.operation(cancel.clone(), apply_op())?;
    with_timeout(control.wait_started()).await;

    assert!(store.is_locked(), "running apply holds the state lock");
    assert_eq!(store.state().map(|s| s.serial), Some(1), "partial write in progress");

    cancel.cancel();
    assert!(!handle.is_done(), "cancel alone must not complete the handle");

    let early = tokio::time::timeout(Duration::from_millis(50), handle.wait()).await;
    assert!(early.is_err(), "handle completed before cleanup finished");

    let outcome = with_timeout(handle.wait()).await;

    assert!(outcome.is_canceled());
    assert_eq!(handle.status(), OperationStatus::Canceled);
    assert_eq!(control.cleanups(), vec![handle.id()]);
    assert!(!store.is_locked());
    assert_eq!(outcome.state.as_ref().map(|s| s.serial), Some(0));
    assert_eq!(store.state().map(|s| s.serial), Some(0), "partial write rolled back");
    assert_eq!(store.persist_count(), 0);
    Ok(())
}

#[tokio::test]
async fn token_cancelled_before_submission_still_completes() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("pre-cancelled");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let handle = backend.operation(cancel, plan_op())?;
    let outcome = with_timeout(handle.wait()).await;

    assert!(matches!(outcome.err, Some(OperationError::Canceled)));
    assert!(!outcome.plan_empty);
    Ok(())
}

#[tokio::test]
async fn apply_cancelled_before_it_starts_writes_nothing() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("pre-cancelled-apply");
    let store = backend.store().ok_or("configured backend has a store")?;
    let control = backend.control();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let handle = backend.operation(cancel, apply_op())?;
    let outcome = with_timeout(handle.wait()).await;

    assert!(outcome.is_canceled());
    assert_eq!(handle.status(), OperationStatus::Canceled);
    assert!(handle.status().is_terminal());
    assert_eq!(control.started_count(), 0, "work stopped before the partial write");
    assert!(control.cleanups().is_empty(), "nothing to roll back");
    assert_eq!(outcome.state.as_ref().map(|s| s.serial), Some(0));
    assert_eq!(store.state().map(|s| s.serial), Some(0));
    assert!(!store.is_locked());
    assert_eq!(store.persist_count(), 0);
    Ok(())
}

#[tokio::test]
async fn execution_failure_is_reported_on_the_handle() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("failure");
    let store = backend.store().ok_or("configured backend has a store")?;
    backend.control().fail_with("provider exploded");

    let handle = backend.operation(CancellationToken::new(), apply_op())?;
    let outcome = with_timeout(handle.wait()).await;

    assert_eq!(outcome.status(), OperationStatus::Failed);
    match outcome.err {
        Some(OperationError::Partial(ref err)) => {
            assert!(err.to_string().contains("provider exploded"))
        }
        ref other => panic!("Expected Partial error, got: {other:?}"),
    }
    // The partially written snapshot is reported alongside the error.
    assert_eq!(outcome.state.as_ref().map(|s| s.serial), Some(1));
    assert!(!store.is_locked());
    Ok(())
}

#[tokio::test]
async fn every_clone_of_a_handle_sees_the_same_outcome() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("clones");
    let handle = backend.operation(CancellationToken::new(), plan_op())?;
    let other = handle.clone();

    let waiter = tokio::spawn(async move { other.wait().await });
    let outcome = with_timeout(handle.wait()).await;
    let from_clone = with_timeout(waiter).await?;

    assert!(Arc::ptr_eq(&outcome, &from_clone));
    let peeked = handle.try_outcome().ok_or("completed handle has an outcome")?;
    assert!(Arc::ptr_eq(&outcome, &peeked));
    Ok(())
}

#[tokio::test]
async fn operation_output_goes_to_the_injected_ui() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("output");
    let out = Arc::new(RecordingOutput::new());

    let op = apply_op().with_ui_output(out.clone());
    let handle = submit(&backend, op, CancellationToken::new())?;
    with_timeout(handle.wait()).await;

    let lines = out.lines();
    assert_eq!(lines.first().map(String::as_str), Some("apply: started"));
    assert!(lines.iter().any(|l| l.starts_with("apply: complete")));
    Ok(())
}

#[tokio::test]
async fn concurrent_operations_on_one_state_are_serialised_by_the_lock() -> TestResult {
    init_tracing();

    let backend = FakeBackend::configured("locking");
    let control = backend.control();
    control.hold();

    let first = backend.operation(CancellationToken::new(), apply_op())?;
    with_timeout(control.wait_started()).await;

    let second = backend.operation(CancellationToken::new(), apply_op())?;
    let rejected = with_timeout(second.wait()).await;
    assert_eq!(rejected.status(), OperationStatus::Failed);
    assert!(rejected.state.is_none());

    control.release();
    assert!(with_timeout(first.wait()).await.is_success());
    Ok(())
}

#[tokio::test]
async fn panicking_work_fails_the_operation() -> TestResult {
    init_tracing();

    let explode = true;
    let handle = spawn_operation(CancellationToken::new(), plan_op(), move |_run| async move {
        if explode {
            panic!("work exploded");
        }
        OperationOutcome::success(None)
    })?;

    let outcome = with_timeout(handle.wait()).await;

    assert!(matches!(outcome.err, Some(OperationError::Execution(_))));
    Ok(())
}

#[tokio::test]
async fn dropped_completer_abandons_the_operation() {
    init_tracing();

    let (handle, completer) = RunningOperation::pending(OperationType::Apply);
    assert_eq!(handle.id(), completer.id());
    drop(completer);

    let outcome = with_timeout(handle.wait()).await;

    assert!(matches!(outcome.err, Some(OperationError::Abandoned)));
    assert_eq!(handle.status(), OperationStatus::Failed);
}

#[tokio::test]
async fn completer_publishes_all_fields_at_once() {
    init_tracing();

    let (handle, completer) = RunningOperation::pending(OperationType::Plan);
    completer.complete(OperationOutcome::planned(
        Some(infra_backend::state::State::new("atomic")),
        true,
    ));

    let outcome = handle.try_outcome().expect("completion is visible immediately");
    assert!(outcome.is_success());
    assert!(outcome.plan_empty);
    assert_eq!(outcome.state.as_ref().map(|s| s.lineage.as_str()), Some("atomic"));
}
