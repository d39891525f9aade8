//! Integer counters over [`BaseTracker`].

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use prf_core::Clock;
use prf_store::PrefStore;
use tracing::debug;

use crate::config::TrackerConfig;
use crate::error::{TrackerError, TrackerResult};
use crate::policy::{PeriodPolicy, TrackerPeriod, TrackerPolicy, TtlPolicy};
use crate::tracker::BaseTracker;

/// Counter that resets when its policy says the window is over.
///
/// `increment` shares the tracker's single lock with `get`: the freshness
/// check, a possible reset and the write of the new total form one critical
/// section, so increments on one instance never lose updates.
pub struct CounterTracker<P> {
    tracker: BaseTracker<i64, P>,
}

/// Counter over a window of fixed length starting at its last reset.
pub type RolloverCounter = CounterTracker<TtlPolicy>;

/// Counter over calendar-aligned periods.
pub type PeriodicCounter = CounterTracker<PeriodPolicy>;

impl<P> CounterTracker<P>
where
    P: TrackerPolicy<i64>,
{
    pub fn new(
        store: Arc<dyn PrefStore>,
        key: &str,
        config: TrackerConfig,
        policy: P,
    ) -> TrackerResult<Self> {
        Ok(Self {
            tracker: BaseTracker::new(store, key, config, policy)?,
        })
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracker: self.tracker.with_clock(clock),
        }
    }

    /// The underlying tracker.
    pub fn tracker(&self) -> &BaseTracker<i64, P> {
        &self.tracker
    }

    /// Add `amount` to the fresh count and return the new total.
    pub async fn increment(&self, amount: i64) -> TrackerResult<i64> {
        let guard = self.tracker.lock().await;
        let current = self.tracker.refresh_locked(&guard).await?;
        let total = current
            .checked_add(amount)
            .ok_or_else(|| TrackerError::Overflow {
                key: self.tracker.value_key().to_string(),
                current,
                amount,
            })?;
        self.tracker.value_pref().set(total).await?;
        debug!(key = %self.tracker.value_key(), value = total, "counter incremented");
        Ok(total)
    }

    /// `increment(1)`.
    pub async fn increment_one(&self) -> TrackerResult<i64> {
        self.increment(1).await
    }

    /// The fresh count, resetting first if the window is over.
    pub async fn get(&self) -> TrackerResult<i64> {
        self.tracker.get().await
    }

    /// Stored count with no freshness check, falling back to 0.
    pub async fn raw(&self) -> TrackerResult<i64> {
        self.tracker.peek().await
    }

    /// `raw() > 0`. Not authoritative: the window may already be over.
    pub async fn is_non_zero(&self) -> TrackerResult<bool> {
        Ok(self.raw().await? > 0)
    }

    /// Set the count to 0 and leave the timestamp alone.
    pub async fn clear_value_only(&self) -> TrackerResult<()> {
        let _guard = self.tracker.lock().await;
        self.tracker.value_pref().set(0).await?;
        Ok(())
    }

    /// Remove both the count and the timestamp.
    pub async fn clear(&self) -> TrackerResult<()> {
        self.tracker.clear().await
    }

    pub async fn has_state(&self) -> TrackerResult<bool> {
        self.tracker.has_state().await
    }

    pub async fn is_currently_expired(&self) -> TrackerResult<bool> {
        self.tracker.is_currently_expired().await
    }

    pub async fn last_update_time(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        self.tracker.last_update_time().await
    }

    pub async fn time_since_last_update(&self) -> TrackerResult<Option<Duration>> {
        self.tracker.time_since_last_update().await
    }
}

impl CounterTracker<TtlPolicy> {
    /// Counter for `key` whose window is `ttl` long, keyed with suffix `rollover`.
    pub fn rollover(store: Arc<dyn PrefStore>, key: &str, ttl: Duration) -> TrackerResult<Self> {
        Self::new(store, key, TrackerConfig::new("rollover"), TtlPolicy::new(ttl))
    }

    /// When the current window ends, or `None` before the first reset.
    pub async fn end_time(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        let ttl = self.tracker.policy().ttl();
        Ok(self.last_update_time().await?.map(|last| last + ttl))
    }

    /// Time left in the current window, zero once it is over.
    pub async fn time_remaining(&self) -> TrackerResult<Option<Duration>> {
        let now = self.tracker.now();
        Ok(self
            .end_time()
            .await?
            .map(|end| (end - now).max(Duration::zero())))
    }
}

impl CounterTracker<PeriodPolicy> {
    /// Counter for `key` that resets every `period`, keyed with suffix `period`.
    pub fn periodic(
        store: Arc<dyn PrefStore>,
        key: &str,
        period: TrackerPeriod,
    ) -> TrackerResult<Self> {
        Self::new(store, key, TrackerConfig::new("period"), PeriodPolicy::new(period))
    }

    pub fn current_period_start(&self) -> DateTime<Utc> {
        self.tracker.policy().period().start_of(self.tracker.now())
    }

    pub fn next_period_start(&self) -> DateTime<Utc> {
        self.tracker.policy().period().next_start(self.tracker.now())
    }

    pub fn time_until_next_period(&self) -> Duration {
        self.next_period_start() - self.tracker.now()
    }
}

impl<P: std::fmt::Debug> std::fmt::Debug for CounterTracker<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterTracker")
            .field("tracker", &self.tracker)
            .finish()
    }
}
