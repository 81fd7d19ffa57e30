// src/operation/support.rs

//! Per-backend declaration of which operation types and fields are accepted.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::errors::SubmitError;
use crate::operation::Operation;
use crate::types::{OperationField, OperationType};

/// Operation type -> fields a backend accepts for it.
///
/// A type missing from the matrix is not supported at all. Any populated
/// field outside the accepted set is rejected, never silently ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportMatrix {
    accepted: BTreeMap<OperationType, BTreeSet<OperationField>>,
}

impl SupportMatrix {
    /// A matrix that supports nothing.
    pub fn empty() -> Self {
        Self {
            accepted: BTreeMap::new(),
        }
    }

    /// Every operation type, each with the fields that are meaningful for it.
    pub fn standard() -> Self {
        use OperationField::*;

        let common = [Module, Targets, Variables];

        Self::empty()
            .allow(OperationType::Plan, common)
            .allow(
                OperationType::Plan,
                [PlanRefresh, PlanOutPath, PlanOutBackend, Destroy],
            )
            .allow(OperationType::Apply, common)
            .allow(OperationType::Apply, [PlanId, Plan, PlanRefresh, Destroy])
            .allow(OperationType::Refresh, common)
            .allow(OperationType::Import, common)
            .allow(OperationType::Destroy, common)
            .allow(OperationType::Destroy, [PlanRefresh, Destroy])
    }

    /// Accept `fields` for `op_type`, adding the type if needed.
    pub fn allow(
        mut self,
        op_type: OperationType,
        fields: impl IntoIterator<Item = OperationField>,
    ) -> Self {
        self.accepted.entry(op_type).or_default().extend(fields);
        self
    }

    /// Stop accepting `field` for `op_type`.
    pub fn deny(mut self, op_type: OperationType, field: OperationField) -> Self {
        if let Some(fields) = self.accepted.get_mut(&op_type) {
            fields.remove(&field);
        }
        self
    }

    /// Stop accepting `field` for every type.
    pub fn deny_everywhere(mut self, field: OperationField) -> Self {
        for fields in self.accepted.values_mut() {
            fields.remove(&field);
        }
        self
    }

    /// Keep only the listed operation types.
    pub fn only(mut self, types: &[OperationType]) -> Self {
        self.accepted.retain(|t, _| types.contains(t));
        self
    }

    pub fn supports(&self, op_type: OperationType) -> bool {
        self.accepted.contains_key(&op_type)
    }

    pub fn accepts(&self, op_type: OperationType, field: OperationField) -> bool {
        self.accepted
            .get(&op_type)
            .is_some_and(|fields| fields.contains(&field))
    }

    pub fn supported_types(&self) -> impl Iterator<Item = OperationType> + '_ {
        self.accepted.keys().copied()
    }

    /// Reject unsupported types and any populated field the type does not
    /// accept. All offending fields are reported together.
    pub fn check(&self, op: &Operation) -> Result<(), SubmitError> {
        let Some(accepted) = self.accepted.get(&op.op_type) else {
            return Err(SubmitError::UnsupportedType(op.op_type));
        };

        let rejected: Vec<OperationField> = op
            .populated_fields()
            .into_iter()
            .filter(|field| !accepted.contains(field))
            .collect();

        if rejected.is_empty() {
            Ok(())
        } else {
            debug!(op_type = %op.op_type, ?rejected, "operation has unsupported fields");
            Err(SubmitError::UnsupportedFields {
                op_type: op.op_type,
                fields: rejected,
            })
        }
    }
}

impl Default for SupportMatrix {
    fn default() -> Self {
        Self::standard()
    }
}

/// Everything a backend should check before accepting an operation:
/// the support matrix, plan/plan id exclusivity, and that there is a fully
/// loaded module to work on (directly or through the plan).
pub fn check_submission(op: &Operation, matrix: &SupportMatrix) -> Result<(), SubmitError> {
    matrix.check(op)?;

    if op.plan.is_some() && op.plan_id.is_some() {
        return Err(SubmitError::Invalid(
            "plan and plan_id are mutually exclusive".to_string(),
        ));
    }

    check_module(op)
}

/// Require a loaded module, unless a plan id stands in for it.
///
/// Plan ids are opaque to the caller; resolving them (and their module) is
/// up to the backend that issued them.
pub fn check_module(op: &Operation) -> Result<(), SubmitError> {
    if op.plan_id.is_some() {
        return Ok(());
    }

    match op.effective_module() {
        None => Err(SubmitError::MissingModule(op.op_type)),
        Some(module) if !module.is_loaded() => Err(SubmitError::ModuleNotLoaded(
            module.source_dir().to_path_buf(),
        )),
        Some(_) => Ok(()),
    }
}
