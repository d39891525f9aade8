//! Expiration-gated trackers for the prf key-value layer.
//!
//! A tracker pairs a typed value with a last-update timestamp and refreshes
//! the pair when a [`TrackerPolicy`] says it has gone stale. Each tracker
//! owns one async lock; every check-then-reset sequence on an instance runs
//! under it, so concurrent callers never observe a value without its
//! timestamp and at most one reset runs per expiry.
//!
//! # Trackers
//!
//! - [`BaseTracker`]: generic value + timestamp under a policy
//! - [`CounterTracker`]: integer counter with lossless `increment`
//! - [`RolloverCounter`]: counter over a fixed-length window
//! - [`PeriodicCounter`]: counter over calendar-aligned [`TrackerPeriod`]s
//! - [`Cooldown`]: gate an action behind a cooldown, counting activations
//!
//! # Keys
//!
//! For a tracker named `key` with [`TrackerConfig::suffix`] `s`, the value
//! lives at `key_s` and the timestamp at `key_last_s`.

pub mod config;
pub mod cooldown;
pub mod counter;
pub mod error;
pub mod policy;
pub mod tracker;

pub use config::TrackerConfig;
pub use cooldown::Cooldown;
pub use counter::{CounterTracker, PeriodicCounter, RolloverCounter};
pub use error::{TrackerError, TrackerResult};
pub use policy::{PeriodPolicy, TrackerPeriod, TrackerPolicy, TtlPolicy};
pub use tracker::BaseTracker;
