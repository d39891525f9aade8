use async_trait::async_trait;

use crate::error::StoreResult;
use crate::value::RawValue;

/// Asynchronous string-keyed preference store.
///
/// All implementations must satisfy these invariants:
/// - A write to one key is atomic with respect to reads of that key.
/// - No ordering or atomicity is promised across different keys.
/// - `remove` on an absent key succeeds.
/// - The store never interprets values beyond their [`RawValue`] shape.
/// - All backend errors are propagated, never silently ignored.
#[async_trait]
pub trait PrefStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn read(&self, key: &str) -> StoreResult<Option<RawValue>>;

    /// Write (create or replace) the raw value stored under `key`.
    async fn write(&self, key: &str, value: RawValue) -> StoreResult<()>;

    /// Remove `key`. Idempotent.
    async fn remove(&self, key: &str) -> StoreResult<()>;

    /// Check whether `key` currently holds any value, regardless of shape.
    async fn exists(&self, key: &str) -> StoreResult<bool>;

    /// List every key currently stored, sorted.
    async fn keys(&self) -> StoreResult<Vec<String>>;

    /// Remove every key.
    ///
    /// Default implementation removes keys one by one. Backends may override
    /// with a single bulk operation.
    async fn clear(&self) -> StoreResult<()> {
        for key in self.keys().await? {
            self.remove(&key).await?;
        }
        Ok(())
    }
}
