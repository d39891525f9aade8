use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::traits::PrefStore;
use crate::value::RawValue;

/// Store operation kinds, used to target injected failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Read,
    Write,
    Remove,
    Exists,
}

/// In-memory, HashMap-based preference store.
///
/// Intended for tests and embedding. Values are held behind a `RwLock` and
/// cloned on read. The store keeps round-trip counters and can be told to fail
/// the next operation of a given kind, so callers can observe exactly when the
/// layers above reach the store.
pub struct InMemoryPrefStore {
    values: RwLock<HashMap<String, RawValue>>,
    reads: AtomicU64,
    writes: AtomicU64,
    pending_failures: Mutex<HashSet<StoreOp>>,
    pending_key_failures: Mutex<HashSet<String>>,
    yield_on_access: bool,
}

impl InMemoryPrefStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            pending_failures: Mutex::new(HashSet::new()),
            pending_key_failures: Mutex::new(HashSet::new()),
            yield_on_access: false,
        }
    }

    /// Create a store that yields to the scheduler before every operation.
    ///
    /// This gives each access a real suspension point, like a platform store
    /// reached over a channel, which lets concurrency tests interleave tasks.
    pub fn yielding() -> Self {
        Self {
            yield_on_access: true,
            ..Self::new()
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `read` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `write` calls served so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next operation of kind `op` fail with a backend error.
    pub fn fail_next(&self, op: StoreOp) {
        if let Ok(mut pending) = self.pending_failures.lock() {
            pending.insert(op);
        }
    }

    /// Make the next write to `key` fail with a backend error.
    pub fn fail_next_write_to(&self, key: &str) {
        if let Ok(mut pending) = self.pending_key_failures.lock() {
            pending.insert(key.to_string());
        }
    }

    /// Peek at a stored value without touching the counters.
    pub fn snapshot(&self, key: &str) -> Option<RawValue> {
        self.values
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    async fn enter(&self, op: StoreOp) -> StoreResult<()> {
        if self.yield_on_access {
            tokio::task::yield_now().await;
        }
        let mut pending = self
            .pending_failures
            .lock()
            .map_err(|_| StoreError::Poisoned)?;
        if pending.remove(&op) {
            return Err(StoreError::Backend(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl Default for InMemoryPrefStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrefStore for InMemoryPrefStore {
    async fn read(&self, key: &str) -> StoreResult<Option<RawValue>> {
        self.enter(StoreOp::Read).await?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        let map = self.values.read().map_err(|_| StoreError::Poisoned)?;
        trace!(key, present = map.contains_key(key), "store read");
        Ok(map.get(key).cloned())
    }

    async fn write(&self, key: &str, value: RawValue) -> StoreResult<()> {
        self.enter(StoreOp::Write).await?;
        if self
            .pending_key_failures
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(key)
        {
            return Err(StoreError::Backend(format!("injected write failure for {key}")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut map = self.values.write().map_err(|_| StoreError::Poisoned)?;
        trace!(key, kind = %value.kind(), "store write");
        map.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.enter(StoreOp::Remove).await?;
        let mut map = self.values.write().map_err(|_| StoreError::Poisoned)?;
        map.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        self.enter(StoreOp::Exists).await?;
        let map = self.values.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.contains_key(key))
    }

    async fn keys(&self) -> StoreResult<Vec<String>> {
        let map = self.values.read().map_err(|_| StoreError::Poisoned)?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.values
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryPrefStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPrefStore")
            .field("key_count", &self.len())
            .field("reads", &self.reads())
            .field("writes", &self.writes())
            .finish()
    }
}
