/// Errors from preference store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend reported a failure (I/O, platform channel, etc.).
    #[error("store backend error: {0}")]
    Backend(String),

    /// The backend is not reachable or has been shut down.
    #[error("store is unavailable")]
    Unavailable,

    /// An internal lock of the backend was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
