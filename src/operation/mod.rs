// src/operation/mod.rs

//! Operation descriptor.
//!
//! An [`Operation`] is built by the caller and handed to a backend by value.
//! Once submitted the caller no longer owns it, so the backend never sees it
//! change underneath it.
//!
//! - [`address`] validates resource addresses used in `targets`.
//! - [`support`] lets each backend declare which fields it accepts per
//!   operation type and checks submissions against that declaration.
//! - [`variables`] defines the variable map and loads variable files.

pub mod address;
pub mod support;
pub mod variables;

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

pub use address::ResourceAddress;
pub use support::{check_module, check_submission, SupportMatrix};
pub use variables::Variables;

use crate::module::ModuleTree;
use crate::plan::{BackendState, Plan};
use crate::types::{OperationField, OperationType};
use crate::ui::{UiInput, UiOutput};
use crate::value::Value;

/// One infrastructure action to perform.
///
/// Which optional fields are meaningful depends on `op_type`; backends
/// reject populated fields they do not accept for that type (see
/// [`SupportMatrix`]).
#[derive(Debug, Clone)]
pub struct Operation {
    pub op_type: OperationType,

    /// Opaque reference to a plan previously computed by the backend.
    pub plan_id: Option<String>,
    /// Refresh state before computing a plan.
    pub plan_refresh: bool,
    /// Where to save the computed plan.
    pub plan_out_path: Option<PathBuf>,
    /// Backend to record with a saved plan.
    pub plan_out_backend: Option<BackendState>,

    /// Root module to operate on. Not needed when `plan`/`plan_id` carries it.
    pub module: Option<Arc<dyn ModuleTree>>,
    /// Plan passed in directly by the caller.
    pub plan: Option<Arc<dyn Plan>>,

    pub destroy: bool,
    pub targets: Vec<ResourceAddress>,
    pub variables: Variables,

    pub ui_in: Option<Arc<dyn UiInput>>,
    pub ui_out: Option<Arc<dyn UiOutput>>,
}

impl Operation {
    pub fn new(op_type: OperationType) -> Self {
        Self {
            op_type,
            plan_id: None,
            plan_refresh: false,
            plan_out_path: None,
            plan_out_backend: None,
            module: None,
            plan: None,
            destroy: false,
            targets: Vec::new(),
            variables: Variables::new(),
            ui_in: None,
            ui_out: None,
        }
    }

    pub fn with_plan_id(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_plan_refresh(mut self, refresh: bool) -> Self {
        self.plan_refresh = refresh;
        self
    }

    pub fn with_plan_out_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.plan_out_path = Some(path.into());
        self
    }

    pub fn with_plan_out_backend(mut self, backend: BackendState) -> Self {
        self.plan_out_backend = Some(backend);
        self
    }

    pub fn with_module(mut self, module: Arc<dyn ModuleTree>) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_plan(mut self, plan: Arc<dyn Plan>) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn with_destroy(mut self, destroy: bool) -> Self {
        self.destroy = destroy;
        self
    }

    pub fn with_target(mut self, target: ResourceAddress) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn with_ui_input(mut self, ui: Arc<dyn UiInput>) -> Self {
        self.ui_in = Some(ui);
        self
    }

    pub fn with_ui_output(mut self, ui: Arc<dyn UiOutput>) -> Self {
        self.ui_out = Some(ui);
        self
    }

    /// Optional fields that carry a value. Flags count when `true`,
    /// collections when non-empty. UI channels are not fields in this sense.
    pub fn populated_fields(&self) -> BTreeSet<OperationField> {
        let mut fields = BTreeSet::new();
        if self.plan_id.is_some() {
            fields.insert(OperationField::PlanId);
        }
        if self.plan.is_some() {
            fields.insert(OperationField::Plan);
        }
        if self.plan_refresh {
            fields.insert(OperationField::PlanRefresh);
        }
        if self.plan_out_path.is_some() {
            fields.insert(OperationField::PlanOutPath);
        }
        if self.plan_out_backend.is_some() {
            fields.insert(OperationField::PlanOutBackend);
        }
        if self.module.is_some() {
            fields.insert(OperationField::Module);
        }
        if self.destroy {
            fields.insert(OperationField::Destroy);
        }
        if !self.targets.is_empty() {
            fields.insert(OperationField::Targets);
        }
        if !self.variables.is_empty() {
            fields.insert(OperationField::Variables);
        }
        fields
    }

    /// The module to operate on: the explicit one, else the plan's.
    pub fn effective_module(&self) -> Option<Arc<dyn ModuleTree>> {
        self.module
            .clone()
            .or_else(|| self.plan.as_ref().and_then(|plan| plan.module()))
    }

    /// Whether this operation removes infrastructure.
    pub fn is_destroy(&self) -> bool {
        self.destroy || self.op_type == OperationType::Destroy
    }

    /// Send a line to the injected output, if any.
    pub fn output(&self, line: &str) {
        if let Some(ref ui) = self.ui_out {
            ui.output(line);
        }
    }
}
