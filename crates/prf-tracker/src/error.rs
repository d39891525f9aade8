//! Error types for tracker operations.

use prf_core::PrfError;
use thiserror::Error;

/// Errors surfaced by trackers.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A preference read or write failed. The tracker's critical section was
    /// abandoned and nothing further was written.
    #[error(transparent)]
    Prf(#[from] PrfError),

    /// The tracker was constructed with an unusable configuration.
    #[error("invalid tracker config: {0}")]
    InvalidConfig(String),

    /// A counter increment would overflow `i64`.
    #[error("counter {key} overflow: {current} + {amount}")]
    Overflow {
        key: String,
        current: i64,
        amount: i64,
    },
}

/// Convenience type alias for tracker operations.
pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
