use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use infra_backend::backend::{Backend, ConfigureOnce, Enhanced, ExecutionContext, Local, LocalContext};
use infra_backend::config::{Attribute, BackendConfig, ConfigSchema, Diagnostics};
use infra_backend::errors::{BackendError, ConfigError, OperationError, SubmitError};
use infra_backend::exec::{spawn_operation, OperationId, OperationOutcome, OperationRun, RunningOperation};
use infra_backend::operation::{check_module, check_submission, Operation, ResourceAddress, SupportMatrix};
use infra_backend::plan::Plan;
use infra_backend::state::{LockInfo, State, StateStore};
use infra_backend::types::{OperationField, OperationType, ValueKind};
use infra_backend::ui::UiInput;
use infra_backend::value::Value;

use crate::builders::FakePlan;
use crate::state_store::MemoryStateStore;

/// Name the fake backend is registered under.
pub const FAKE_BACKEND: &str = "fake";

/// Options understood by [`FakeBackend`].
pub fn fake_schema() -> ConfigSchema {
    ConfigSchema::new()
        .attribute(
            Attribute::required("lineage", ValueKind::String)
                .with_description("Lineage of the state this backend manages"),
        )
        .attribute(Attribute::optional("workspace", ValueKind::String).with_default("default"))
        .attribute(
            Attribute::optional("parallelism", ValueKind::Number).with_check(positive_integer),
        )
        .attribute(
            Attribute::optional("address", ValueKind::String)
                .deprecated("use 'lineage' instead"),
        )
}

fn positive_integer(value: &Value) -> std::result::Result<(), String> {
    match value.as_number() {
        Some(n) if n >= 1.0 && n.fract() == 0.0 => Ok(()),
        _ => Err(format!("expected a positive integer, got {value}")),
    }
}

/// Knobs shared between a test and the operations a [`FakeBackend`] runs.
///
/// - `hold` parks every operation after it has started, until `release` or
///   cancellation.
/// - `fail_with` makes the next operations fail after the hold point.
/// - `set_cleanup_delay` slows down the rollback done on cancellation, so
///   tests can observe that completion waits for it.
#[derive(Debug, Default)]
pub struct FakeControl {
    gate: Mutex<Option<CancellationToken>>,
    started: Notify,
    started_count: AtomicUsize,
    cleanup_delay: Mutex<Duration>,
    cleanups: Mutex<Vec<OperationId>>,
    failure: Mutex<Option<String>>,
    submitted: Mutex<Vec<OperationType>>,
}

impl FakeControl {
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(CancellationToken::new());
    }

    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.cancel();
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn set_cleanup_delay(&self, delay: Duration) {
        *self.cleanup_delay.lock().unwrap() = delay;
    }

    /// Resolves once an operation has reached its hold point.
    pub async fn wait_started(&self) {
        self.started.notified().await
    }

    pub fn started_count(&self) -> usize {
        self.started_count.load(Ordering::SeqCst)
    }

    /// Operations that were rolled back after cancellation, in order.
    pub fn cleanups(&self) -> Vec<OperationId> {
        self.cleanups.lock().unwrap().clone()
    }

    /// Types of every operation the backend accepted.
    pub fn submitted(&self) -> Vec<OperationType> {
        self.submitted.lock().unwrap().clone()
    }

    fn mark_started(&self) {
        self.started_count.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
    }

    async fn wait_for_release(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.cancelled().await;
        }
    }

    async fn clean_up(&self, id: OperationId) {
        let delay = *self.cleanup_delay.lock().unwrap();
        tokio::time::sleep(delay).await;
        self.cleanups.lock().unwrap().push(id);
    }

    fn failure(&self) -> Option<String> {
        self.failure.lock().unwrap().clone()
    }
}

/// In-memory backend with every capability, for tests.
///
/// Operations lock the state, optionally refresh it, and then compute the
/// desired resource set from the module, targets and destroy flag. Mutating
/// operations write a partial snapshot before the hold point; cancellation
/// rolls it back before the outcome is published.
#[derive(Debug)]
pub struct FakeBackend {
    schema: ConfigSchema,
    support: SupportMatrix,
    enhanced: bool,
    local: bool,
    configured: ConfigureOnce<Arc<MemoryStateStore>>,
    control: Arc<FakeControl>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            schema: fake_schema(),
            support: SupportMatrix::standard().deny_everywhere(OperationField::PlanId),
            enhanced: true,
            local: true,
            configured: ConfigureOnce::new(),
            control: Arc::new(FakeControl::default()),
        }
    }

    /// A backend already configured with `lineage`. Panics if that fails.
    pub fn configured(lineage: &str) -> Self {
        let mut backend = Self::new();
        backend
            .configure(&crate::builders::fake_config(lineage))
            .expect("fake backend accepts its own config");
        backend
    }

    pub fn with_support(mut self, support: SupportMatrix) -> Self {
        self.support = support;
        self
    }

    pub fn without_enhanced(mut self) -> Self {
        self.enhanced = false;
        self
    }

    pub fn without_local(mut self) -> Self {
        self.local = false;
        self
    }

    pub fn control(&self) -> Arc<FakeControl> {
        Arc::clone(&self.control)
    }

    /// The state store built by `configure`, if any.
    pub fn store(&self) -> Option<Arc<MemoryStateStore>> {
        self.configured.get().cloned()
    }

    /// Registry factory.
    pub fn factory() -> Box<dyn Backend> {
        Box::new(Self::new())
    }
}

impl Backend for FakeBackend {
    fn input(
        &self,
        ui: &dyn UiInput,
        config: BackendConfig,
    ) -> std::result::Result<BackendConfig, ConfigError> {
        self.schema.input(ui, config)
    }

    fn validate(&self, config: &BackendConfig) -> Diagnostics {
        self.schema.validate(config)
    }

    fn configure(&mut self, config: &BackendConfig) -> std::result::Result<(), ConfigError> {
        self.schema.check_supported(config)?;
        if let Some(err) = self.schema.validate(config).errors.into_iter().next() {
            return Err(err);
        }

        let schema = &self.schema;
        self.configured.configure_with(config, |config| {
            let config = schema.apply_defaults(config);
            let lineage = config
                .get_str("lineage")
                .ok_or_else(|| ConfigError::MissingRequired {
                    key: "lineage".to_string(),
                })?;
            Ok(Arc::new(MemoryStateStore::new(lineage)))
        })
    }

    fn state(&self) -> std::result::Result<Arc<dyn StateStore>, BackendError> {
        match self.configured.get() {
            Some(store) => Ok(Arc::clone(store) as Arc<dyn StateStore>),
            None => Err(BackendError::StateUnavailable(
                "backend is not configured".to_string(),
            )),
        }
    }

    fn as_enhanced(&self) -> Option<&dyn Enhanced> {
        if self.enhanced {
            Some(self as &dyn Enhanced)
        } else {
            None
        }
    }

    fn as_local(&self) -> Option<&dyn Local> {
        if self.local {
            Some(self as &dyn Local)
        } else {
            None
        }
    }
}

impl Enhanced for FakeBackend {
    fn operation(
        &self,
        cancel: CancellationToken,
        operation: Operation,
    ) -> std::result::Result<RunningOperation, SubmitError> {
        let store = self.store().ok_or(SubmitError::NotConfigured)?;
        check_submission(&operation, &self.support)?;

        let op_type = operation.op_type;
        let control = Arc::clone(&self.control);
        let handle = spawn_operation(cancel, operation, move |run| execute(run, store, control))?;
        self.control.submitted.lock().unwrap().push(op_type);
        Ok(handle)
    }
}

impl Local for FakeBackend {
    fn context(&self, operation: &Operation) -> std::result::Result<LocalContext, BackendError> {
        let store = self.store().ok_or(SubmitError::NotConfigured)?;
        check_module(operation)?;
        Ok(LocalContext {
            context: Box::new(FakeContext {
                operation: operation.clone(),
                store: Arc::clone(&store),
            }),
            state: store,
        })
    }
}

async fn execute(
    run: OperationRun,
    store: Arc<MemoryStateStore>,
    control: Arc<FakeControl>,
) -> OperationOutcome {
    let info = LockInfo::new(run.operation.op_type.as_str(), "fake-backend");
    let lock_id = match store.lock(&info) {
        Ok(id) => id,
        Err(err) => return OperationOutcome::failed(err, None),
    };

    let outcome = execute_locked(&run, &store, &control).await;

    match store.unlock(&lock_id) {
        Ok(()) => outcome,
        Err(err) => OperationOutcome::failed(err, outcome.state),
    }
}

async fn execute_locked(
    run: &OperationRun,
    store: &MemoryStateStore,
    control: &FakeControl,
) -> OperationOutcome {
    let op = &run.operation;

    let refresh = op.plan_refresh || op.op_type == OperationType::Refresh;
    if refresh || store.state().is_none() {
        if let Err(err) = store.refresh_state() {
            return OperationOutcome::failed(err, None);
        }
    }
    let before = store.state().unwrap_or_default();

    if let Err(err) = run.check_cancelled() {
        run.output(&format!("{}: canceled before any change", op.op_type));
        return OperationOutcome::failed(err, Some(before));
    }

    let mutates = matches!(
        op.op_type,
        OperationType::Apply | OperationType::Import | OperationType::Destroy
    );
    if mutates {
        if let Err(err) = store.write_state(before.next_serial()) {
            return OperationOutcome::failed(err, Some(before));
        }
    }

    run.output(&format!("{}: started", op.op_type));
    control.mark_started();

    if run.until_cancelled(control.wait_for_release()).await.is_none() {
        control.clean_up(run.id).await;
        if mutates {
            if let Err(err) = store.write_state(before.clone()) {
                return OperationOutcome::failed(OperationError::Partial(err), store.state());
            }
        }
        run.output(&format!("{}: canceled", op.op_type));
        return OperationOutcome::canceled(store.state());
    }

    if let Some(message) = control.failure() {
        if mutates {
            // Leaves the partial snapshot in place.
            return OperationOutcome::failed(OperationError::Partial(anyhow!(message)), store.state());
        }
        return OperationOutcome::failed(anyhow!(message), store.state());
    }

    match op.op_type {
        OperationType::Plan => {
            let desired = desired_state(&before, op);
            let plan_empty = desired.resources == before.resources;
            run.output(&format!("plan: {} resource(s) after apply", desired.resources.len()));
            OperationOutcome::planned(Some(before), plan_empty)
        }
        OperationType::Refresh => OperationOutcome::success(Some(before)),
        OperationType::Apply | OperationType::Import | OperationType::Destroy => {
            let desired = match op.plan {
                Some(ref plan) if plan.is_empty() => before.clone(),
                _ => desired_state(&before, op),
            };
            if let Err(err) = store.write_state(desired.clone()).and_then(|()| store.persist_state()) {
                return OperationOutcome::failed(OperationError::Partial(err), store.state());
            }
            run.output(&format!(
                "{}: complete, {} resource(s)",
                op.op_type,
                desired.resources.len()
            ));
            OperationOutcome::success(Some(desired))
        }
    }
}

/// State after applying `op` to `current`.
///
/// Targets narrow the change to the listed addresses. Destroy removes,
/// import records the targets, everything else converges on the module's
/// declared resources. The serial moves only if something changed.
fn desired_state(current: &State, op: &Operation) -> State {
    let declared: Vec<String> = op
        .effective_module()
        .map(|module| module.resources().iter().map(ToString::to_string).collect())
        .unwrap_or_default();
    let targeted =
        |address: &str| op.targets.is_empty() || op.targets.iter().any(|t| t.as_str() == address);

    let mut next = current.clone();
    match op.op_type {
        OperationType::Import => {
            for target in op.targets.iter() {
                next.resources
                    .insert(target.to_string(), Value::from("imported"));
            }
        }
        _ if op.is_destroy() => next.resources.retain(|address, _| !targeted(address.as_str())),
        _ => {
            next.resources
                .retain(|address, _| !targeted(address.as_str()) || declared.contains(address));
            for address in declared.iter().filter(|a| targeted(a.as_str())) {
                next.resources
                    .entry(address.clone())
                    .or_insert_with(|| Value::from("managed"));
            }
        }
    }

    next.serial = if next.resources == current.resources {
        current.serial
    } else {
        current.serial + 1
    };
    next
}

/// Local execution context over the fake's state store.
#[derive(Debug)]
struct FakeContext {
    operation: Operation,
    store: Arc<MemoryStateStore>,
}

impl FakeContext {
    fn current(&self) -> Result<State> {
        if self.store.state().is_none() {
            self.store.refresh_state()?;
        }
        Ok(self.store.state().unwrap_or_default())
    }

    fn commit(&self, operation: &Operation) -> Result<State> {
        let desired = desired_state(&self.current()?, operation);
        self.store.write_state(desired.clone())?;
        self.store.persist_state()?;
        Ok(desired)
    }
}

impl ExecutionContext for FakeContext {
    fn validate(&self) -> Result<()> {
        check_module(&self.operation)?;
        Ok(())
    }

    fn refresh(&mut self) -> Result<State> {
        self.store.refresh_state()?;
        Ok(self.store.state().unwrap_or_default())
    }

    fn plan(&mut self) -> Result<Arc<dyn Plan>> {
        let current = self.current()?;
        let desired = desired_state(&current, &self.operation);
        let mut plan = FakePlan::new(desired.resources == current.resources);
        if let Some(module) = self.operation.effective_module() {
            plan = plan.with_module(module);
        }
        Ok(plan.build())
    }

    fn apply(&mut self) -> Result<State> {
        let operation = self.operation.clone();
        self.commit(&operation)
    }

    fn import(&mut self, targets: &[ResourceAddress]) -> Result<State> {
        let mut operation = self.operation.clone();
        operation.op_type = OperationType::Import;
        operation.targets = targets.to_vec();
        self.commit(&operation)
    }
}

/// Backend with no optional capability: configuration and state only.
#[derive(Debug, Default)]
pub struct MinimalBackend {
    configured: ConfigureOnce<Arc<MemoryStateStore>>,
}

impl MinimalBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory() -> Box<dyn Backend> {
        Box::new(Self::new())
    }

    fn schema() -> ConfigSchema {
        ConfigSchema::new().attribute(
            Attribute::optional("path", ValueKind::String).with_default("terraform.tfstate"),
        )
    }
}

impl Backend for MinimalBackend {
    fn input(
        &self,
        ui: &dyn UiInput,
        config: BackendConfig,
    ) -> std::result::Result<BackendConfig, ConfigError> {
        Self::schema().input(ui, config)
    }

    fn validate(&self, config: &BackendConfig) -> Diagnostics {
        Self::schema().validate(config)
    }

    fn configure(&mut self, config: &BackendConfig) -> std::result::Result<(), ConfigError> {
        Self::schema().check_supported(config)?;
        self.configured
            .configure_with(config, |_| Ok(Arc::new(MemoryStateStore::new("minimal"))))
    }

    fn state(&self) -> std::result::Result<Arc<dyn StateStore>, BackendError> {
        self.configured
            .get()
            .map(|store| Arc::clone(store) as Arc<dyn StateStore>)
            .ok_or_else(|| BackendError::StateUnavailable("backend is not configured".to_string()))
    }
}
