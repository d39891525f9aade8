//! Key-value store boundary for typed preferences.
//!
//! The store is treated as an opaque, asynchronous, string-keyed map whose
//! values are restricted to a closed set of primitive shapes ([`RawValue`]).
//! Everything above this crate -- adapters, cached and isolated preference
//! objects, trackers -- reduces its data to one of those shapes.
//!
//! # Storage Backends
//!
//! All backends implement the [`PrefStore`] trait:
//!
//! - [`InMemoryPrefStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. The store never interprets values beyond their [`RawValue`] shape.
//! 2. Per-key writes are atomic; nothing wider is promised.
//! 3. Removing an absent key is not an error.
//! 4. All backend errors are propagated, never retried or silently ignored.

pub mod error;
pub mod memory;
pub mod traits;
pub mod value;

// Re-export primary types at crate root for ergonomic imports.
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryPrefStore, StoreOp};
pub use traits::PrefStore;
pub use value::{RawKind, RawValue};
