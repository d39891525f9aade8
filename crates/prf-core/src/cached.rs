//! [`Prf`]: a preference object with a private read cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use prf_adapter::{Adapter, AdapterRegistry};
use prf_store::PrefStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::base::BasePrf;
use crate::error::PrfResult;
use crate::isolated::PrfIso;
use crate::traits::TypedPref;

/// Last known stored value of one [`Prf`].
struct CacheEntry<T> {
    loaded: bool,
    /// Stored value before the default is applied. `None` caches absence.
    value: Option<T>,
    /// Bumped by every write or removal, so a read that raced with one does
    /// not overwrite the newer state.
    generation: u64,
}

impl<T> CacheEntry<T> {
    fn empty() -> Self {
        Self {
            loaded: false,
            value: None,
            generation: 0,
        }
    }

    fn store(&mut self, value: Option<T>) {
        self.loaded = true;
        self.value = value;
        self.generation += 1;
    }

    fn invalidate(&mut self) {
        self.loaded = false;
        self.value = None;
        self.generation += 1;
    }
}

/// Cached preference object.
///
/// The first read populates an in-memory entry, later reads are served from
/// it. Writes go to the store first and then replace the entry, so a `set`
/// is visible to the next `get` on the same instance.
///
/// The cache is coherent with this instance's own writes only. Writes made
/// through other handles for the same key are not observed until
/// [`invalidate`](Prf::invalidate) is called; use [`PrfIso`] where that
/// matters.
pub struct Prf<T> {
    base: BasePrf<T>,
    cache: Mutex<CacheEntry<T>>,
}

impl<T> Prf<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Bind `key` using the built-in adapter for `T`.
    pub fn new(store: Arc<dyn PrefStore>, key: impl Into<String>) -> PrfResult<Self> {
        Ok(Self::from_base(BasePrf::new(store, key)?))
    }

    /// Bind `key` using the adapter `registry` holds for `T`.
    pub fn from_registry(
        store: Arc<dyn PrefStore>,
        registry: &AdapterRegistry,
        key: impl Into<String>,
    ) -> PrfResult<Self> {
        Ok(Self::from_base(BasePrf::from_registry(store, registry, key)?))
    }

    /// Bind `key` using an explicit adapter.
    pub fn with_adapter(
        store: Arc<dyn PrefStore>,
        key: impl Into<String>,
        adapter: impl Adapter<T>,
    ) -> Self {
        Self::from_base(BasePrf::with_adapter(store, key, adapter))
    }

    pub fn from_base(base: BasePrf<T>) -> Self {
        Self {
            base,
            cache: Mutex::new(CacheEntry::empty()),
        }
    }

    /// Set the value returned by reads while the key is absent.
    pub fn with_default(self, value: T) -> Self {
        Self::from_base(self.base.with_default(value))
    }

    pub fn base(&self) -> &BasePrf<T> {
        &self.base
    }

    /// Returns `true` if the next read will be served from memory.
    pub fn is_cached(&self) -> bool {
        self.entry().loaded
    }

    /// Cached value with the default applied, without touching the store.
    ///
    /// Returns `None` when nothing is cached yet.
    pub fn cached_value(&self) -> Option<Option<T>> {
        let entry = self.entry();
        entry
            .loaded
            .then(|| self.base.apply_default(entry.value.clone()))
    }

    /// Drop the cached entry so the next read goes to the store.
    pub fn invalidate(&self) {
        self.entry().invalidate();
    }

    fn entry(&self) -> MutexGuard<'_, CacheEntry<T>> {
        // The entry is plain data; a panic mid-update cannot break it.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Prf<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind `key` storing `T` as a JSON document.
    pub fn json(store: Arc<dyn PrefStore>, key: impl Into<String>) -> Self {
        Self::from_base(BasePrf::json(store, key))
    }
}

impl<T> Prf<T>
where
    T: PartialEq + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    /// Bind `key` storing `T` as its index in `variants`.
    pub fn enumerated(
        store: Arc<dyn PrefStore>,
        key: impl Into<String>,
        variants: impl Into<Vec<T>>,
    ) -> Self {
        Self::from_base(BasePrf::enumerated(store, key, variants))
    }
}

#[async_trait]
impl<T> TypedPref<T> for Prf<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        self.base.key()
    }

    async fn get(&self) -> PrfResult<Option<T>> {
        let generation = {
            let entry = self.entry();
            if entry.loaded {
                return Ok(self.base.apply_default(entry.value.clone()));
            }
            entry.generation
        };

        debug!(key = %self.base.key(), "cache miss");
        let stored = self.base.read_stored().await?;

        let mut entry = self.entry();
        if entry.generation == generation {
            entry.store(stored.clone());
            Ok(self.base.apply_default(stored))
        } else {
            // A write landed while we were reading; it is the newer state.
            Ok(self.base.apply_default(entry.value.clone()))
        }
    }

    async fn set(&self, value: T) -> PrfResult<()> {
        if let Err(e) = self.base.write(&value).await {
            // The store may or may not hold the value now.
            self.invalidate();
            return Err(e);
        }
        self.entry().store(Some(value));
        Ok(())
    }

    async fn remove(&self) -> PrfResult<()> {
        let result = self.base.delete().await;
        self.invalidate();
        result
    }

    async fn exists_on_prefs(&self) -> PrfResult<bool> {
        self.base.exists().await
    }

    fn isolated(&self) -> PrfIso<T> {
        PrfIso::from_base(self.base.clone())
    }
}

impl<T> std::fmt::Debug for Prf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prf")
            .field("key", &self.base.key())
            .field(
                "cached",
                &self
                    .cache
                    .lock()
                    .map(|entry| entry.loaded)
                    .unwrap_or(false),
            )
            .finish()
    }
}
