// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of infrastructure operation a backend is asked to perform.
///
/// This is a closed set. Backends that only implement part of it reject the
/// rest at submission time with a descriptive error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Plan,
    Apply,
    Refresh,
    Import,
    Destroy,
}

impl OperationType {
    pub const ALL: [OperationType; 5] = [
        OperationType::Plan,
        OperationType::Apply,
        OperationType::Refresh,
        OperationType::Import,
        OperationType::Destroy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationType::Plan => "plan",
            OperationType::Apply => "apply",
            OperationType::Refresh => "refresh",
            OperationType::Import => "import",
            OperationType::Destroy => "destroy",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plan" => Ok(OperationType::Plan),
            "apply" => Ok(OperationType::Apply),
            "refresh" => Ok(OperationType::Refresh),
            "import" => Ok(OperationType::Import),
            "destroy" => Ok(OperationType::Destroy),
            other => Err(format!(
                "invalid operation type: {other} (expected one of plan, apply, refresh, import, destroy)"
            )),
        }
    }
}

/// Optional fields of an [`Operation`](crate::operation::Operation).
///
/// Used by support matrices to describe which fields a backend accepts for
/// each operation type, and in errors to name the offending field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationField {
    PlanId,
    Plan,
    PlanRefresh,
    PlanOutPath,
    PlanOutBackend,
    Module,
    Destroy,
    Targets,
    Variables,
}

impl OperationField {
    pub const ALL: [OperationField; 9] = [
        OperationField::PlanId,
        OperationField::Plan,
        OperationField::PlanRefresh,
        OperationField::PlanOutPath,
        OperationField::PlanOutBackend,
        OperationField::Module,
        OperationField::Destroy,
        OperationField::Targets,
        OperationField::Variables,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OperationField::PlanId => "plan_id",
            OperationField::Plan => "plan",
            OperationField::PlanRefresh => "plan_refresh",
            OperationField::PlanOutPath => "plan_out_path",
            OperationField::PlanOutBackend => "plan_out_backend",
            OperationField::Module => "module",
            OperationField::Destroy => "destroy",
            OperationField::Targets => "targets",
            OperationField::Variables => "variables",
        }
    }
}

impl fmt::Display for OperationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind tag of a [`Value`](crate::value::Value), used by config schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Number,
    Bool,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::String => "string",
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::List => "list",
            ValueKind::Map => "map",
        };
        f.write_str(s)
    }
}
