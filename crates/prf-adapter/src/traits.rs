use prf_store::RawValue;

use crate::error::{AdapterError, AdapterResult};

/// Encode/decode capability mapping `T` onto a raw store shape.
///
/// Implementations are pure: no I/O, no interior state that changes across
/// calls. For every valid `x`, `decode(encode(x)?)? == x`.
pub trait Adapter<T>: Send + Sync + 'static {
    /// Encode a value into its raw store shape.
    fn encode(&self, value: &T) -> AdapterResult<RawValue>;

    /// Decode a raw store value.
    ///
    /// Returns [`AdapterError::DecodeMismatch`] when `raw` has a different
    /// shape than this adapter writes.
    fn decode(&self, raw: RawValue) -> AdapterResult<T>;
}

/// Build the mismatch error for an unexpected raw shape.
pub(crate) fn mismatch(expected: prf_store::RawKind, found: &RawValue) -> AdapterError {
    AdapterError::DecodeMismatch {
        expected,
        found: found.kind(),
    }
}
