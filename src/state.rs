// src/state.rs

//! State store interface.
//!
//! Storage format, persistence target and locking strategy all belong to the
//! store implementation; backends only hand out an `Arc<dyn StateStore>` and
//! callers decide when to refresh/persist it.

use std::collections::BTreeMap;
use std::fmt::Debug;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Snapshot of previously provisioned infrastructure.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    /// Incremented on every write that changes the snapshot.
    pub serial: u64,
    /// Identifies the history this snapshot belongs to.
    pub lineage: String,
    /// Resource address -> recorded attributes.
    #[serde(default)]
    pub resources: BTreeMap<String, Value>,
}

impl State {
    pub fn new(lineage: impl Into<String>) -> Self {
        Self {
            serial: 0,
            lineage: lineage.into(),
            resources: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resource(&self, address: &str) -> Option<&Value> {
        self.resources.get(address)
    }

    /// Return a copy with `serial` bumped, for writers that replace a snapshot.
    pub fn next_serial(&self) -> Self {
        let mut next = self.clone();
        next.serial += 1;
        next
    }
}

/// Who holds a state lock and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockInfo {
    pub operation: String,
    pub who: String,
}

impl LockInfo {
    pub fn new(operation: impl Into<String>, who: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            who: who.into(),
        }
    }
}

/// Handle to a backend's state target.
///
/// Obtaining a handle does not load anything: call [`refresh_state`] before
/// reading when the latest persisted snapshot is needed.
///
/// [`refresh_state`]: StateStore::refresh_state
pub trait StateStore: Send + Sync + Debug {
    /// Current in-memory snapshot, `None` if nothing has been loaded/written.
    fn state(&self) -> Option<State>;

    /// Replace the in-memory snapshot. Not persisted until [`persist_state`].
    ///
    /// [`persist_state`]: StateStore::persist_state
    fn write_state(&self, state: State) -> Result<()>;

    /// Load the latest persisted snapshot into memory.
    fn refresh_state(&self) -> Result<()>;

    /// Persist the in-memory snapshot.
    fn persist_state(&self) -> Result<()>;

    /// Acquire the state lock, returning a lock id. Stores without locking
    /// accept every request.
    fn lock(&self, _info: &LockInfo) -> Result<String> {
        Ok(String::new())
    }

    fn unlock(&self, _lock_id: &str) -> Result<()> {
        Ok(())
    }
}
