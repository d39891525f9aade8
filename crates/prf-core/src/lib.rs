//! Typed preference objects for the prf key-value layer.
//!
//! A preference object binds a string key to an [`Adapter`](prf_adapter::Adapter)
//! and an optional default, and exposes typed get/set/remove over an opaque
//! [`PrefStore`](prf_store::PrefStore).
//!
//! # Architecture
//!
//! - [`BasePrf`] owns the key, adapter, default and store handle and performs
//!   every store round trip.
//! - [`Prf`] adds a private in-memory cache, coherent with its own writes
//!   only.
//! - [`PrfIso`] has no in-memory state at all. Use it wherever the same key
//!   is written by more than one handle, task group or process.
//! - Both implement [`TypedPref`], so callers can stay agnostic of the
//!   caching strategy.
//!
//! # Modules
//!
//! - [`error`]: [`PrfError`] and [`PrfResult`]
//! - [`traits`]: The [`TypedPref`] interface
//! - [`base`]: [`BasePrf`]
//! - [`cached`]: [`Prf`]
//! - [`isolated`]: [`PrfIso`]
//! - [`clock`]: Injectable wall clock

pub mod base;
pub mod cached;
pub mod clock;
pub mod error;
pub mod isolated;
pub mod traits;

pub use base::BasePrf;
pub use cached::Prf;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{PrfError, PrfResult};
pub use isolated::PrfIso;
pub use traits::TypedPref;
