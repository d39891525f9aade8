//! Timestamp-only tracker that gates an action behind a cooldown period.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use prf_adapter::{DateTimeAdapter, IntAdapter};
use prf_core::{Clock, SystemClock, TypedPref};
use prf_store::PrefStore;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::tracker::typed_pref;

/// Cooldown gate with an activation counter.
///
/// Stores the time of the last activation under `<key>_last_<suffix>` and
/// the number of activations under `<key>_count_<suffix>`. The check and
/// the write in [`try_use`](Self::try_use) run under one lock, so on one
/// instance only a single caller can win each cooldown window.
pub struct Cooldown {
    last_activated: Arc<dyn TypedPref<DateTime<Utc>>>,
    activations: Arc<dyn TypedPref<i64>>,
    duration: Duration,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl Cooldown {
    /// Cooldown for `key` lasting `duration`, keyed with suffix `cooldown`.
    pub fn new(store: Arc<dyn PrefStore>, key: &str, duration: Duration) -> TrackerResult<Self> {
        Self::with_config(store, key, duration, TrackerConfig::new("cooldown"))
    }

    pub fn with_config(
        store: Arc<dyn PrefStore>,
        key: &str,
        duration: Duration,
        config: TrackerConfig,
    ) -> TrackerResult<Self> {
        config.validate(key)?;
        let last_activated = typed_pref::<DateTime<Utc>>(
            Arc::clone(&store),
            config.last_update_key(key),
            Arc::new(DateTimeAdapter),
            config.use_cache,
        );
        let activations = typed_pref::<i64>(
            store,
            format!("{key}_count_{}", config.suffix),
            Arc::new(IntAdapter),
            config.use_cache,
        );
        Ok(Self {
            last_activated,
            activations,
            duration,
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    fn active_at(&self, now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> bool {
        last.is_some_and(|last| now - last < self.duration)
    }

    /// Returns `true` while the last activation is within the cooldown.
    pub async fn is_cooldown_active(&self) -> TrackerResult<bool> {
        let last = self.last_activated.get().await?;
        Ok(self.active_at(self.clock.now(), last))
    }

    /// Returns `true` once the cooldown has elapsed or was never started.
    pub async fn is_expired(&self) -> TrackerResult<bool> {
        Ok(!self.is_cooldown_active().await?)
    }

    /// Activate if not cooling down. Returns whether this call activated.
    pub async fn try_use(&self) -> TrackerResult<bool> {
        let _guard = self.lock.lock().await;
        let now = self.clock.now();
        let previous = self.last_activated.get().await?;
        if self.active_at(now, previous) {
            return Ok(false);
        }
        let count = self.activations.get_or_fallback(0).await?.saturating_add(1);
        self.last_activated.set(now).await?;

        // Activation time and count are committed together or not at all.
        if let Err(e) = self.activations.set(count).await {
            let rollback = match previous {
                Some(last) => self.last_activated.set(last).await,
                None => self.last_activated.remove().await,
            };
            if let Err(rollback_err) = rollback {
                warn!(key = %self.last_activated.key(), error = %rollback_err, "cooldown rollback failed");
            }
            return Err(e.into());
        }
        debug!(key = %self.last_activated.key(), activations = count, "cooldown activated");
        Ok(true)
    }

    /// Time of the last activation.
    pub async fn last_activation_time(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        Ok(self.last_activated.get().await?)
    }

    /// When the current cooldown ends, or `None` if never activated.
    pub async fn next_activation_time(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        Ok(self
            .last_activated
            .get()
            .await?
            .map(|last| last + self.duration))
    }

    /// Time left until the next activation is allowed; zero when allowed now.
    pub async fn time_remaining(&self) -> TrackerResult<Duration> {
        let now = self.clock.now();
        Ok(self
            .next_activation_time()
            .await?
            .map(|next| (next - now).max(Duration::zero()))
            .unwrap_or_else(Duration::zero))
    }

    /// Number of successful activations so far.
    pub async fn activation_count(&self) -> TrackerResult<i64> {
        Ok(self.activations.get_or_fallback(0).await?)
    }

    /// End the current cooldown early. The activation count is kept.
    pub async fn reset(&self) -> TrackerResult<()> {
        let _guard = self.lock.lock().await;
        self.last_activated.remove().await?;
        Ok(())
    }

    /// Remove the activation time and the count.
    pub async fn complete_reset(&self) -> TrackerResult<()> {
        let _guard = self.lock.lock().await;
        self.last_activated.remove().await?;
        self.activations.remove().await?;
        Ok(())
    }

    pub async fn has_state(&self) -> TrackerResult<bool> {
        Ok(self.last_activated.exists_on_prefs().await?
            || self.activations.exists_on_prefs().await?)
    }
}

impl std::fmt::Debug for Cooldown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cooldown")
            .field("last_activated_key", &self.last_activated.key())
            .field("activations_key", &self.activations.key())
            .field("duration", &self.duration)
            .finish()
    }
}
