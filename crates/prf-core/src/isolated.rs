//! [`PrfIso`]: a preference object with no in-memory state.

use std::sync::Arc;

use async_trait::async_trait;
use prf_adapter::{Adapter, AdapterRegistry};
use prf_store::PrefStore;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::base::BasePrf;
use crate::error::PrfResult;
use crate::traits::TypedPref;

/// Isolated preference object.
///
/// Every operation is a fresh round trip to the store. Safe to construct in
/// any number of independent contexts that share one store, because there is
/// no private copy of the value that could drift from it.
pub struct PrfIso<T> {
    base: BasePrf<T>,
}

impl<T> Clone for PrfIso<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
        }
    }
}

impl<T> PrfIso<T>
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
        Self { base }
    }

    /// Set the value returned by reads while the key is absent.
    pub fn with_default(self, value: T) -> Self {
        Self::from_base(self.base.with_default(value))
    }

    pub fn base(&self) -> &BasePrf<T> {
        &self.base
    }
}

impl<T> PrfIso<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind `key` storing `T` as a JSON document.
    pub fn json(store: Arc<dyn PrefStore>, key: impl Into<String>) -> Self {
        Self::from_base(BasePrf::json(store, key))
    }
}

impl<T> PrfIso<T>
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
impl<T> TypedPref<T> for PrfIso<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn key(&self) -> &str {
        self.base.key()
    }

    async fn get(&self) -> PrfResult<Option<T>> {
        self.base.read().await
    }

    async fn set(&self, value: T) -> PrfResult<()> {
        self.base.write(&value).await
    }

    async fn remove(&self) -> PrfResult<()> {
        self.base.delete().await
    }

    async fn exists_on_prefs(&self) -> PrfResult<bool> {
        self.base.exists().await
    }

    fn isolated(&self) -> PrfIso<T> {
        self.clone()
    }
}

impl<T> std::fmt::Debug for PrfIso<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrfIso")
            .field("key", &self.base.key())
            .finish()
    }
}
