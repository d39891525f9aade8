//! Key + adapter + default bound to a store: every call is a round trip.

use std::sync::Arc;

use prf_adapter::{Adapter, AdapterRegistry, EnumAdapter, JsonAdapter};
use prf_store::PrefStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{trace, warn};

use crate::error::{PrfError, PrfResult};

/// A typed view of one store key.
///
/// Holds no mutable state of its own. Cloning is cheap and yields a handle
/// to the same key, adapter and store.
pub struct BasePrf<T> {
    key: String,
    adapter: Arc<dyn Adapter<T>>,
    default: Option<T>,
    store: Arc<dyn PrefStore>,
}

impl<T> Clone for BasePrf<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            adapter: Arc::clone(&self.adapter),
            default: self.default.clone(),
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> BasePrf<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn default_value(&self) -> Option<&T> {
        self.default.as_ref()
    }

    pub fn store(&self) -> &Arc<dyn PrefStore> {
        &self.store
    }
}

impl<T> BasePrf<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Bind `key` using the built-in adapter for `T`.
    ///
    /// Fails with [`AdapterError::NotRegistered`](prf_adapter::AdapterError::NotRegistered)
    /// when `T` is not a built-in type.
    pub fn new(store: Arc<dyn PrefStore>, key: impl Into<String>) -> PrfResult<Self> {
        Self::from_registry(store, AdapterRegistry::builtins(), key)
    }

    /// Bind `key` using the adapter `registry` holds for `T`.
    pub fn from_registry(
        store: Arc<dyn PrefStore>,
        registry: &AdapterRegistry,
        key: impl Into<String>,
    ) -> PrfResult<Self> {
        let adapter = registry.lookup::<T>()?;
        Ok(Self::from_shared(store, key, adapter))
    }

    /// Bind `key` using an explicit adapter.
    pub fn with_adapter(
        store: Arc<dyn PrefStore>,
        key: impl Into<String>,
        adapter: impl Adapter<T>,
    ) -> Self {
        Self::from_shared(store, key, Arc::new(adapter))
    }

    /// Bind `key` using an adapter shared with other objects.
    pub fn from_shared(
        store: Arc<dyn PrefStore>,
        key: impl Into<String>,
        adapter: Arc<dyn Adapter<T>>,
    ) -> Self {
        Self {
            key: key.into(),
            adapter,
            default: None,
            store,
        }
    }

    /// Set the value returned by reads while the key is absent.
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// Read and decode the stored value, without applying the default.
    pub async fn read_stored(&self) -> PrfResult<Option<T>> {
        let Some(raw) = self.store.read(&self.key).await? else {
            trace!(key = %self.key, "no stored value");
            return Ok(None);
        };
        let found = raw.kind();
        match self.adapter.decode(raw) {
            Ok(value) => Ok(Some(value)),
            Err(source) => {
                warn!(key = %self.key, %found, error = %source, "stored value does not decode");
                Err(PrfError::Decode {
                    key: self.key.clone(),
                    source,
                })
            }
        }
    }

    /// Apply the default to a stored read result.
    pub fn apply_default(&self, stored: Option<T>) -> Option<T> {
        stored.or_else(|| self.default.clone())
    }

    /// Read the value, falling back to the default when absent.
    pub async fn read(&self) -> PrfResult<Option<T>> {
        let stored = self.read_stored().await?;
        Ok(self.apply_default(stored))
    }

    /// Encode `value` and write it under the key.
    pub async fn write(&self, value: &T) -> PrfResult<()> {
        let raw = self.adapter.encode(value).map_err(|source| PrfError::Encode {
            key: self.key.clone(),
            source,
        })?;
        self.store.write(&self.key, raw).await?;
        Ok(())
    }

    /// Remove the key from the store.
    pub async fn delete(&self) -> PrfResult<()> {
        self.store.remove(&self.key).await?;
        Ok(())
    }

    /// Returns `true` iff the key currently holds a value.
    pub async fn exists(&self) -> PrfResult<bool> {
        Ok(self.store.exists(&self.key).await?)
    }
}

impl<T> BasePrf<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind `key` storing `T` as a JSON document.
    pub fn json(store: Arc<dyn PrefStore>, key: impl Into<String>) -> Self {
        Self::with_adapter(store, key, JsonAdapter::<T>::new())
    }
}

impl<T> BasePrf<T>
where
    T: PartialEq + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    /// Bind `key` storing `T` as its index in `variants`.
    pub fn enumerated(
        store: Arc<dyn PrefStore>,
        key: impl Into<String>,
        variants: impl Into<Vec<T>>,
    ) -> Self {
        Self::with_adapter(store, key, EnumAdapter::new(variants))
    }
}

impl<T> std::fmt::Debug for BasePrf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePrf")
            .field("key", &self.key)
            .field("has_default", &self.default.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prf_adapter::AdapterError;
    use prf_store::{InMemoryPrefStore, RawValue, StoreError, StoreOp};

    fn store() -> Arc<InMemoryPrefStore> {
        Arc::new(InMemoryPrefStore::new())
    }

    #[tokio::test]
    async fn read_absent_without_default_is_none() {
        let pref = BasePrf::<i64>::new(store(), "count").unwrap();
        assert_eq!(pref.read().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_absent_uses_default() {
        let pref = BasePrf::<i64>::new(store(), "count")
            .unwrap()
            .with_default(5);
        assert_eq!(pref.read().await.unwrap(), Some(5));
        assert_eq!(pref.read_stored().await.unwrap(), None);
    }

    #[tokio::test]
    async fn write_then_read() {
        let pref = BasePrf::<String>::new(store(), "name").unwrap();
        pref.write(&"ada".to_string()).await.unwrap();
        assert_eq!(pref.read().await.unwrap().as_deref(), Some("ada"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let pref = BasePrf::<bool>::new(store(), "flag").unwrap();
        pref.write(&true).await.unwrap();
        assert!(pref.exists().await.unwrap());
        pref.delete().await.unwrap();
        pref.delete().await.unwrap();
        assert!(!pref.exists().await.unwrap());
    }

    #[tokio::test]
    async fn unregistered_type_fails_at_construction() {
        #[derive(Clone)]
        struct Custom;
        let err = BasePrf::<Custom>::new(store(), "custom").unwrap_err();
        assert!(matches!(
            err,
            PrfError::Adapter(AdapterError::NotRegistered { .. })
        ));
    }

    #[tokio::test]
    async fn mismatched_shape_is_a_decode_error() {
        let backing = store();
        backing.write("count", RawValue::from("not a number")).await.unwrap();
        let pref = BasePrf::<i64>::new(backing, "count").unwrap().with_default(0);
        let err = pref.read().await.unwrap_err();
        assert!(err.is_decode());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let backing = store();
        backing.fail_next(StoreOp::Read);
        let pref = BasePrf::<i64>::new(backing, "count").unwrap();
        assert!(matches!(
            pref.read().await,
            Err(PrfError::Store(StoreError::Backend(_)))
        ));
    }

    #[tokio::test]
    async fn encode_failure_does_not_write() {
        #[derive(Debug, Clone, PartialEq)]
        enum Level {
            Low,
            High,
        }
        let backing = store();
        let pref = BasePrf::enumerated(backing.clone(), "level", [Level::Low]);
        let err = pref.write(&Level::High).await.unwrap_err();
        assert!(matches!(err, PrfError::Encode { .. }));
        assert_eq!(backing.writes(), 0);
    }

    #[tokio::test]
    async fn json_object_round_trip() {
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Window {
            width: u32,
            height: u32,
        }
        let pref = BasePrf::<Window>::json(store(), "window");
        let value = Window {
            width: 800,
            height: 600,
        };
        pref.write(&value).await.unwrap();
        assert_eq!(pref.read().await.unwrap(), Some(value));
    }
}
