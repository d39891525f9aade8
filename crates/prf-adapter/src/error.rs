//! Error types for adapter lookup and value conversion.

use prf_store::RawKind;
use thiserror::Error;

/// Errors produced while resolving or running an adapter.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No adapter was registered for the requested type.
    #[error("no adapter registered for type {type_name}")]
    NotRegistered { type_name: &'static str },

    /// A different adapter is already registered for this type.
    #[error("type {type_name} already has adapter {existing}, cannot register {requested}")]
    Conflict {
        type_name: &'static str,
        existing: &'static str,
        requested: &'static str,
    },

    /// The stored shape is not the one the adapter expects.
    #[error("decode mismatch: expected {expected}, found {found}")]
    DecodeMismatch { expected: RawKind, found: RawKind },

    /// The stored shape is right but its content is not a valid value.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// JSON encoding or decoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for adapter operations.
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;
