//! Built-in adapters for the shapes the store holds natively.

use prf_store::{RawKind, RawValue};

use crate::error::{AdapterError, AdapterResult};
use crate::traits::{mismatch, Adapter};

/// Declares a zero-sized adapter that maps `T` 1:1 onto one raw variant.
macro_rules! native_adapter {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $variant:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
        pub struct $name;

        impl Adapter<$ty> for $name {
            fn encode(&self, value: &$ty) -> AdapterResult<RawValue> {
                Ok(RawValue::$variant(value.clone()))
            }

            fn decode(&self, raw: RawValue) -> AdapterResult<$ty> {
                match raw {
                    RawValue::$variant(value) => Ok(value),
                    other => Err(mismatch(RawKind::$variant, &other)),
                }
            }
        }
    };
}

native_adapter!(
    /// `String` stored as a raw string.
    StringAdapter, String, String
);
native_adapter!(
    /// `i64` stored as a raw integer.
    IntAdapter, i64, Int
);
native_adapter!(
    /// `bool` stored as a raw boolean.
    BoolAdapter, bool, Bool
);
native_adapter!(
    /// `f64` stored as a raw double.
    DoubleAdapter, f64, Double
);
native_adapter!(
    /// `Vec<u8>` stored as raw bytes.
    BytesAdapter, Vec<u8>, Bytes
);
native_adapter!(
    /// `Vec<String>` stored as a native string list.
    StringListAdapter, Vec<String>, StringList
);
native_adapter!(
    /// `Vec<i64>` stored as a native integer list.
    IntListAdapter, Vec<i64>, IntList
);

/// `i32` widened to a raw integer. Out-of-range stored values are rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct I32Adapter;

impl Adapter<i32> for I32Adapter {
    fn encode(&self, value: &i32) -> AdapterResult<RawValue> {
        Ok(RawValue::Int(i64::from(*value)))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<i32> {
        match raw {
            RawValue::Int(value) => i32::try_from(value)
                .map_err(|_| AdapterError::InvalidValue(format!("{value} does not fit in i32"))),
            other => Err(mismatch(RawKind::Int, &other)),
        }
    }
}

/// `u32` widened to a raw integer. Negative or oversized stored values are rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct U32Adapter;

impl Adapter<u32> for U32Adapter {
    fn encode(&self, value: &u32) -> AdapterResult<RawValue> {
        Ok(RawValue::Int(i64::from(*value)))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<u32> {
        match raw {
            RawValue::Int(value) => u32::try_from(value)
                .map_err(|_| AdapterError::InvalidValue(format!("{value} does not fit in u32"))),
            other => Err(mismatch(RawKind::Int, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn string_round_trip(s in ".*") {
            let raw = StringAdapter.encode(&s).unwrap();
            prop_assert_eq!(StringAdapter.decode(raw).unwrap(), s);
        }

        #[test]
        fn int_round_trip(v in any::<i64>()) {
            let raw = IntAdapter.encode(&v).unwrap();
            prop_assert_eq!(IntAdapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn double_round_trip(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            let raw = DoubleAdapter.encode(&v).unwrap();
            prop_assert_eq!(DoubleAdapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn bytes_round_trip(v in proptest::collection::vec(any::<u8>(), 0..64)) {
            let raw = BytesAdapter.encode(&v).unwrap();
            prop_assert_eq!(BytesAdapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn i32_round_trip(v in any::<i32>()) {
            let raw = I32Adapter.encode(&v).unwrap();
            prop_assert_eq!(I32Adapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn u32_round_trip(v in any::<u32>()) {
            let raw = U32Adapter.encode(&v).unwrap();
            prop_assert_eq!(U32Adapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn string_list_round_trip(v in proptest::collection::vec(".*", 0..16)) {
            let raw = StringListAdapter.encode(&v).unwrap();
            prop_assert_eq!(StringListAdapter.decode(raw).unwrap(), v);
        }

        #[test]
        fn int_list_round_trip(v in proptest::collection::vec(any::<i64>(), 0..32)) {
            let raw = IntListAdapter.encode(&v).unwrap();
            prop_assert_eq!(IntListAdapter.decode(raw).unwrap(), v);
        }
    }

    #[test]
    fn lists_round_trip() {
        let strings = vec!["a".to_string(), String::new(), "c".to_string()];
        let raw = StringListAdapter.encode(&strings).unwrap();
        assert_eq!(StringListAdapter.decode(raw).unwrap(), strings);

        let ints = vec![-1, 0, i64::MAX];
        let raw = IntListAdapter.encode(&ints).unwrap();
        assert_eq!(IntListAdapter.decode(raw).unwrap(), ints);
    }

    #[test]
    fn bool_round_trip() {
        for v in [true, false] {
            let raw = BoolAdapter.encode(&v).unwrap();
            assert_eq!(BoolAdapter.decode(raw).unwrap(), v);
        }
    }

    #[test]
    fn wrong_shape_is_a_mismatch() {
        let err = IntAdapter.decode(RawValue::from("42")).unwrap_err();
        assert!(matches!(
            err,
            AdapterError::DecodeMismatch {
                expected: RawKind::Int,
                found: RawKind::String
            }
        ));
    }

    #[test]
    fn double_does_not_accept_int() {
        assert!(DoubleAdapter.decode(RawValue::Int(1)).is_err());
    }

    #[test]
    fn narrow_ints_reject_out_of_range() {
        assert!(matches!(
            I32Adapter.decode(RawValue::Int(i64::MAX)),
            Err(AdapterError::InvalidValue(_))
        ));
        assert!(matches!(
            U32Adapter.decode(RawValue::Int(-1)),
            Err(AdapterError::InvalidValue(_))
        ));
    }
}
