//! serde-backed adapters for structured values.

use std::marker::PhantomData;

use prf_store::{RawKind, RawValue};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::AdapterResult;
use crate::traits::{mismatch, Adapter};

/// Any serde type stored as a JSON string.
pub struct JsonAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonAdapter<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Adapter<T> for JsonAdapter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn encode(&self, value: &T) -> AdapterResult<RawValue> {
        Ok(RawValue::String(serde_json::to_string(value)?))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<T> {
        match raw {
            RawValue::String(text) => serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, "stored json does not match the target type");
                e.into()
            }),
            other => Err(mismatch(RawKind::String, &other)),
        }
    }
}

/// A list of serde values stored as a native string list, one JSON document
/// per element.
pub struct JsonListAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonListAdapter<T> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonListAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Adapter<Vec<T>> for JsonListAdapter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn encode(&self, value: &Vec<T>) -> AdapterResult<RawValue> {
        let items = value
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RawValue::StringList(items))
    }

    fn decode(&self, raw: RawValue) -> AdapterResult<Vec<T>> {
        match raw {
            RawValue::StringList(items) => Ok(items
                .iter()
                .map(|item| serde_json::from_str(item))
                .collect::<Result<Vec<_>, _>>()?),
            other => Err(mismatch(RawKind::StringList, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use proptest::prelude::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        level: u32,
    }

    fn ada() -> Profile {
        Profile {
            name: "ada".into(),
            level: 3,
        }
    }

    fn profile() -> impl Strategy<Value = Profile> {
        (".*", any::<u32>()).prop_map(|(name, level)| Profile { name, level })
    }

    proptest! {
        #[test]
        fn json_round_trip_law(p in profile()) {
            let adapter = JsonAdapter::<Profile>::new();
            let raw = adapter.encode(&p).unwrap();
            prop_assert_eq!(adapter.decode(raw).unwrap(), p);
        }

        #[test]
        fn json_list_round_trip_law(items in proptest::collection::vec(profile(), 0..8)) {
            let adapter = JsonListAdapter::<Profile>::new();
            let raw = adapter.encode(&items).unwrap();
            prop_assert_eq!(adapter.decode(raw).unwrap(), items);
        }
    }

    #[test]
    fn json_round_trip() {
        let adapter = JsonAdapter::<Profile>::new();
        let raw = adapter.encode(&ada()).unwrap();
        assert!(matches!(raw, RawValue::String(_)));
        assert_eq!(adapter.decode(raw).unwrap(), ada());
    }

    #[test]
    fn json_rejects_other_shapes() {
        let adapter = JsonAdapter::<Profile>::new();
        assert!(matches!(
            adapter.decode(RawValue::Int(1)),
            Err(AdapterError::DecodeMismatch { .. })
        ));
    }

    #[test]
    fn json_rejects_malformed_text() {
        let adapter = JsonAdapter::<Profile>::new();
        assert!(matches!(
            adapter.decode(RawValue::from("{\"name\":1}")),
            Err(AdapterError::Json(_))
        ));
    }

    #[test]
    fn json_list_stores_one_document_per_item() {
        let adapter = JsonListAdapter::<Profile>::new();
        let items = vec![ada(), Profile { name: "bob".into(), level: 1 }];
        let raw = adapter.encode(&items).unwrap();
        match &raw {
            RawValue::StringList(docs) => assert_eq!(docs.len(), 2),
            other => panic!("unexpected shape {other:?}"),
        }
        assert_eq!(adapter.decode(raw).unwrap(), items);
    }

    #[test]
    fn json_list_empty_round_trip() {
        let adapter = JsonListAdapter::<Profile>::new();
        let raw = adapter.encode(&Vec::new()).unwrap();
        assert!(adapter.decode(raw).unwrap().is_empty());
    }
}
