//! Enums stored by their position in a fixed variant list.

use prf_store::{RawKind, RawValue};

use crate::error::{AdapterError, AdapterResult};
use crate::traits::{mismatch, Adapter};

/// Stores a value as its index within `variants`.
///
/// The variant list fixes the on-disk encoding: reordering it changes the
/// meaning of values already stored. Appending is safe.
#[derive(Clone, Debug)]
pub struct EnumAdapter<T> {
    variants: Vec<T>,
}

impl<T: PartialEq> EnumAdapter<T> {
    pub fn new(variants: impl Into<Vec<T>>) -> Self {
        Self {
            variants: variants.into(),
        }
    }

    /// The variant list, in index order.
    pub fn variants(&self) -> &[T] {
        &self.variants
    }
}

impl<T> Adapter<T> for EnumAdapter<T>
where
    T: PartialEq + Clone + std::fmt::Debug + Send + Sync + 'static,
{
    fn encode(&self, value: &T) -> AdapterResult<RawValue> {
        let index = self
            .variants
            .iter()
            .position(|v| v == value)
            .ok_or_else(|| AdapterError::InvalidValue(format!("{value:?} is not a listed variant")))?;
        Ok(RawValue::Int(index as i64))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<T> {
        match raw {
            RawValue::Int(index) => usize::try_from(index)
                .ok()
                .and_then(|i| self.variants.get(i))
                .cloned()
                .ok_or_else(|| {
                    AdapterError::InvalidValue(format!(
                        "variant index {index} out of range 0..{}",
                        self.variants.len()
                    ))
                }),
            other => Err(mismatch(RawKind::Int, &other)),
        }
    }
}
