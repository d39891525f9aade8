//! The [`TypedPref`] interface shared by cached and isolated objects.

use async_trait::async_trait;

use crate::error::PrfResult;
use crate::isolated::PrfIso;

/// Typed accessor for one key of a preference store.
///
/// Every operation is fallible: store failures and decode mismatches are
/// returned to the caller, never replaced by a default.
#[async_trait]
pub trait TypedPref<T>: Send + Sync
where
    T: Clone + Send + Sync + 'static,
{
    /// The store key this object reads and writes.
    fn key(&self) -> &str;

    /// Read the value, falling back to the object's default when absent.
    async fn get(&self) -> PrfResult<Option<T>>;

    /// Read the value, substituting `fallback` when neither a stored value
    /// nor a default exists.
    async fn get_or_fallback(&self, fallback: T) -> PrfResult<T> {
        Ok(self.get().await?.unwrap_or(fallback))
    }

    /// Encode and write `value`.
    async fn set(&self, value: T) -> PrfResult<()>;

    /// Delete the key. Removing an absent key is not an error.
    async fn remove(&self) -> PrfResult<()>;

    /// Returns `true` iff the key holds any stored value, of any shape.
    async fn exists_on_prefs(&self) -> PrfResult<bool>;

    /// Returns `true` when [`get`](Self::get) would yield `None`.
    async fn is_null(&self) -> PrfResult<bool> {
        Ok(self.get().await?.is_none())
    }

    /// An equivalent handle with no in-memory caching.
    fn isolated(&self) -> PrfIso<T>;
}
