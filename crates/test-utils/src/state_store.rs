use std::sync::Mutex;

use anyhow::{anyhow, Result};
use infra_backend::state::{LockInfo, State, StateStore};

#[derive(Debug, Default)]
struct Inner {
    current: Option<State>,
    persisted: Option<State>,
    lock: Option<(String, LockInfo)>,
    next_lock: u64,
    persist_count: usize,
}

/// State store kept entirely in memory, with a single exclusive lock.
///
/// "Persisted" state is a second in-memory slot, so tests can tell apart
/// what was written from what was persisted.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    inner: Mutex<Inner>,
}

impl MemoryStateStore {
    /// Store whose persisted state is an empty snapshot with `lineage`.
    pub fn new(lineage: &str) -> Self {
        Self::with_persisted(State::new(lineage))
    }

    pub fn with_persisted(state: State) -> Self {
        Self {
            inner: Mutex::new(Inner {
                persisted: Some(state),
                ..Inner::default()
            }),
        }
    }

    pub fn persisted(&self) -> Option<State> {
        self.inner.lock().unwrap().persisted.clone()
    }

    pub fn persist_count(&self) -> usize {
        self.inner.lock().unwrap().persist_count
    }

    pub fn lock_holder(&self) -> Option<LockInfo> {
        self.inner
            .lock()
            .unwrap()
            .lock
            .as_ref()
            .map(|(_, info)| info.clone())
    }

    pub fn is_locked(&self) -> bool {
        self.lock_holder().is_some()
    }
}

impl StateStore for MemoryStateStore {
    fn state(&self) -> Option<State> {
        self.inner.lock().unwrap().current.clone()
    }

    fn write_state(&self, state: State) -> Result<()> {
        self.inner.lock().unwrap().current = Some(state);
        Ok(())
    }

    fn refresh_state(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.current = inner.persisted.clone();
        Ok(())
    }

    fn persist_state(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.persisted = inner.current.clone();
        inner.persist_count += 1;
        Ok(())
    }

    fn lock(&self, info: &LockInfo) -> Result<String> {
        let mut inner = self.inner.lock().unwrap();
        if let Some((_, ref held)) = inner.lock {
            return Err(anyhow!(
                "state is locked by {} for {}",
                held.who,
                held.operation
            ));
        }
        inner.next_lock += 1;
        let id = format!("lock-{}", inner.next_lock);
        inner.lock = Some((id.clone(), info.clone()));
        Ok(id)
    }

    fn unlock(&self, lock_id: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let held = inner.lock.as_ref().map(|(id, _)| id.clone());
        match held {
            Some(id) if id == lock_id => {
                inner.lock = None;
                Ok(())
            }
            Some(id) => Err(anyhow!("lock id mismatch: held {id}, got {lock_id}")),
            None => Err(anyhow!("state is not locked")),
        }
    }
}
