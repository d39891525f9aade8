//! Error types for preference object operations.

use prf_adapter::AdapterError;
use prf_store::StoreError;
use thiserror::Error;

/// Errors surfaced by preference objects.
#[derive(Debug, Error)]
pub enum PrfError {
    /// The underlying store failed. Propagated unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No adapter could be resolved for the value type.
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// The stored value does not decode with this object's adapter.
    ///
    /// Signals that the key is shared with an incompatible type or that the
    /// store was modified externally.
    #[error("cannot decode value stored at {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: AdapterError,
    },

    /// The value could not be encoded for the store.
    #[error("cannot encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: AdapterError,
    },
}

impl PrfError {
    /// Returns `true` for decode failures (corruption or key collisions).
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Convenience type alias for preference operations.
pub type PrfResult<T> = std::result::Result<T, PrfError>;
