//! Adapters between typed preference values and raw store shapes.
//!
//! An [`Adapter<T>`] is a stateless encode/decode pair that maps a logical
//! type `T` onto one [`RawValue`](prf_store::RawValue) shape. Adapters must
//! obey the round-trip law: `decode(encode(x)) == x` for every valid `x`.
//!
//! # Modules
//!
//! - [`traits`]: The [`Adapter`] capability
//! - [`primitive`]: Built-in adapters for the store's native shapes
//! - [`time`]: `chrono` timestamps and durations as epoch milliseconds
//! - [`json`]: serde-backed adapters for arbitrary structured values
//! - [`enumeration`]: Enums stored by variant index
//! - [`registry`]: [`AdapterRegistry`], one adapter per logical type

pub mod enumeration;
pub mod error;
pub mod json;
pub mod primitive;
pub mod registry;
pub mod time;
pub mod traits;

pub use enumeration::EnumAdapter;
pub use error::{AdapterError, AdapterResult};
pub use json::{JsonAdapter, JsonListAdapter};
pub use primitive::{
    BoolAdapter, BytesAdapter, DoubleAdapter, I32Adapter, IntAdapter, IntListAdapter,
    StringAdapter, StringListAdapter, U32Adapter,
};
pub use registry::AdapterRegistry;
pub use time::{DateTimeAdapter, DurationAdapter};
pub use traits::Adapter;
