//! [`BaseTracker`]: a value plus its last-update timestamp, refreshed under
//! a per-instance lock.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use prf_adapter::{Adapter, AdapterRegistry, DateTimeAdapter};
use prf_core::{BasePrf, Clock, Prf, PrfError, PrfIso, SystemClock, TypedPref};
use prf_store::PrefStore;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::policy::TrackerPolicy;

/// Build a cached or isolated object for `key`.
pub(crate) fn typed_pref<T>(
    store: Arc<dyn PrefStore>,
    key: String,
    adapter: Arc<dyn Adapter<T>>,
    use_cache: bool,
) -> Arc<dyn TypedPref<T>>
where
    T: Clone + Send + Sync + 'static,
{
    let base = BasePrf::from_shared(store, key, adapter);
    if use_cache {
        Arc::new(Prf::from_base(base))
    } else {
        Arc::new(PrfIso::from_base(base))
    }
}

/// Held while a tracker's `{value, timestamp}` pair is being read or written.
pub(crate) type TrackerGuard<'a> = MutexGuard<'a, ()>;

/// Expiration-gated value tracker.
///
/// The tracker is in one of two states:
///
/// - **Fresh**: a timestamp exists and the policy says it has not expired.
/// - **Stale**: no timestamp exists, or the policy says it has expired.
///
/// [`get`](Self::get) moves a stale tracker to fresh by writing the policy's
/// reset value and then the new timestamp. Both writes happen inside the
/// tracker's lock, so concurrent callers on one instance never see one
/// without the other and at most one reset runs at a time.
///
/// The lock covers this instance only. Two trackers built over the same keys
/// are not coordinated with each other.
pub struct BaseTracker<T, P> {
    value: Arc<dyn TypedPref<T>>,
    last_update: Arc<dyn TypedPref<DateTime<Utc>>>,
    policy: P,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl<T, P> BaseTracker<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: TrackerPolicy<T>,
{
    /// Create a tracker for `key` using the built-in adapter for `T`.
    pub fn new(
        store: Arc<dyn PrefStore>,
        key: &str,
        config: TrackerConfig,
        policy: P,
    ) -> TrackerResult<Self> {
        let adapter = AdapterRegistry::builtins()
            .lookup::<T>()
            .map_err(PrfError::from)?;
        Self::with_adapter(store, key, config, adapter, policy)
    }

    /// Create a tracker for `key` storing values through `adapter`.
    pub fn with_adapter(
        store: Arc<dyn PrefStore>,
        key: &str,
        config: TrackerConfig,
        adapter: Arc<dyn Adapter<T>>,
        policy: P,
    ) -> TrackerResult<Self> {
        config.validate(key)?;
        let value = typed_pref(
            Arc::clone(&store),
            config.value_key(key),
            adapter,
            config.use_cache,
        );
        let last_update = typed_pref::<DateTime<Utc>>(
            store,
            config.last_update_key(key),
            Arc::new(DateTimeAdapter),
            config.use_cache,
        );
        Ok(Self {
            value,
            last_update,
            policy,
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        })
    }

    /// Replace the wall clock, e.g. with a [`ManualClock`](prf_core::ManualClock).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn value_key(&self) -> &str {
        self.value.key()
    }

    pub fn last_update_key(&self) -> &str {
        self.last_update.key()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn value_pref(&self) -> &dyn TypedPref<T> {
        self.value.as_ref()
    }

    pub(crate) async fn lock(&self) -> TrackerGuard<'_> {
        self.lock.lock().await
    }

    /// Return the current value, resetting it first if it is stale.
    pub async fn get(&self) -> TrackerResult<T> {
        let guard = self.lock().await;
        self.refresh_locked(&guard).await
    }

    /// Unconditionally reset the value and timestamp.
    pub async fn reset(&self) -> TrackerResult<()> {
        let guard = self.lock().await;
        self.reset_locked(&guard, self.now()).await
    }

    /// Freshness check and read. The caller holds the tracker lock.
    pub(crate) async fn refresh_locked(&self, guard: &TrackerGuard<'_>) -> TrackerResult<T> {
        let now = self.now();
        let expired = match self.last_update.get().await? {
            Some(last) => self.policy.is_expired(now, last),
            None => true,
        };
        if expired {
            self.reset_locked(guard, now).await?;
        }
        Ok(self
            .value
            .get_or_fallback(self.policy.fallback_value())
            .await?)
    }

    /// Write the reset value, then the timestamp. The caller holds the lock.
    ///
    /// If the timestamp write fails the previous value is put back, so this
    /// layer never leaves a new value paired with an old timestamp.
    async fn reset_locked(
        &self,
        _guard: &TrackerGuard<'_>,
        now: DateTime<Utc>,
    ) -> TrackerResult<()> {
        // An undecodable value cannot be restored, so a rollback removes it.
        let previous = match self.value.get().await {
            Ok(previous) => previous,
            Err(e) if e.is_decode() => None,
            Err(e) => return Err(e.into()),
        };
        let fresh = self.policy.reset_value(now);
        self.value.set(fresh).await?;

        let stamp = self.policy.reset_timestamp(now);
        if let Err(e) = self.last_update.set(stamp).await {
            let rollback = match previous {
                Some(old) => self.value.set(old).await,
                None => self.value.remove().await,
            };
            if let Err(rollback_err) = rollback {
                warn!(key = %self.value.key(), error = %rollback_err, "reset rollback failed");
            }
            return Err(e.into());
        }

        debug!(key = %self.value.key(), last_update = %stamp, "tracker reset");
        Ok(())
    }

    /// Current value without a freshness check, without the lock, and
    /// without ever resetting.
    ///
    /// Not serialized against [`get`](Self::get): the result may be stale or
    /// about to be replaced.
    pub async fn peek(&self) -> TrackerResult<T> {
        Ok(self
            .value
            .get_or_fallback(self.policy.fallback_value())
            .await?)
    }

    /// Returns `true` if either the value or the timestamp is stored.
    pub async fn has_state(&self) -> TrackerResult<bool> {
        Ok(self.value.exists_on_prefs().await? || self.last_update.exists_on_prefs().await?)
    }

    /// Remove both the value and the timestamp.
    pub async fn clear(&self) -> TrackerResult<()> {
        let _guard = self.lock().await;
        self.value.remove().await?;
        self.last_update.remove().await?;
        debug!(key = %self.value.key(), "tracker cleared");
        Ok(())
    }

    /// Returns `true` if the tracker is stale right now. Never resets.
    pub async fn is_currently_expired(&self) -> TrackerResult<bool> {
        Ok(match self.last_update.get().await? {
            Some(last) => self.policy.is_expired(self.now(), last),
            None => true,
        })
    }

    pub async fn last_update_time(&self) -> TrackerResult<Option<DateTime<Utc>>> {
        Ok(self.last_update.get().await?)
    }

    pub async fn time_since_last_update(&self) -> TrackerResult<Option<Duration>> {
        Ok(self
            .last_update_time()
            .await?
            .map(|last| self.now() - last))
    }
}

impl<T, P> std::fmt::Debug for BaseTracker<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseTracker")
            .field("value_key", &self.value.key())
            .field("last_update_key", &self.last_update.key())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use prf_core::ManualClock;
    use prf_store::{InMemoryPrefStore, RawValue, StoreOp};

    use crate::error::TrackerError;
    use crate::policy::TtlPolicy;

    /// TTL policy that resets to 42 and counts its resets.
    #[derive(Debug, Default)]
    struct FortyTwo {
        resets: AtomicUsize,
    }

    impl TrackerPolicy<i64> for FortyTwo {
        fn is_expired(&self, now: DateTime<Utc>, last: DateTime<Utc>) -> bool {
            now - last >= Duration::seconds(60)
        }

        fn reset_value(&self, _now: DateTime<Utc>) -> i64 {
            self.resets.fetch_add(1, Ordering::SeqCst);
            42
        }

        fn fallback_value(&self) -> i64 {
            0
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn setup(
        config: TrackerConfig,
    ) -> (Arc<InMemoryPrefStore>, Arc<ManualClock>, BaseTracker<i64, FortyTwo>) {
        let store = Arc::new(InMemoryPrefStore::new());
        let clock = Arc::new(ManualClock::at_epoch());
        let tracker = BaseTracker::new(store.clone(), "score", config, FortyTwo::default())
            .unwrap()
            .with_clock(clock.clone());
        (store, clock, tracker)
    }

    #[tokio::test]
    async fn ttl_scenario() {
        let (store, clock, tracker) = setup(TrackerConfig::new("ttl"));

        assert_eq!(tracker.get().await.unwrap(), 42);
        assert_eq!(tracker.last_update_time().await.unwrap(), Some(at(0)));
        let writes_after_first = store.writes();

        clock.set(at(30));
        assert_eq!(tracker.get().await.unwrap(), 42);
        assert_eq!(store.writes(), writes_after_first);
        assert_eq!(tracker.policy().resets.load(Ordering::SeqCst), 1);

        clock.set(at(61));
        assert_eq!(tracker.peek().await.unwrap(), 42);
        assert!(tracker.is_currently_expired().await.unwrap());
        assert_eq!(tracker.policy().resets.load(Ordering::SeqCst), 1);

        assert_eq!(tracker.get().await.unwrap(), 42);
        assert_eq!(tracker.policy().resets.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.last_update_time().await.unwrap(), Some(at(61)));
    }

    #[tokio::test]
    async fn composite_keys_land_in_the_store() {
        let (store, _, tracker) = setup(TrackerConfig::new("daily"));
        tracker.get().await.unwrap();
        assert_eq!(tracker.value_key(), "score_daily");
        assert_eq!(tracker.last_update_key(), "score_last_daily");
        assert_eq!(store.snapshot("score_daily"), Some(RawValue::Int(42)));
        assert_eq!(store.snapshot("score_last_daily"), Some(RawValue::Int(0)));
    }

    #[tokio::test]
    async fn expiration_boundary() {
        let (_, clock, tracker) = setup(TrackerConfig::default());
        clock.set(at(100));
        tracker.reset().await.unwrap();

        clock.set(at(159));
        assert!(!tracker.is_currently_expired().await.unwrap());
        clock.advance(Duration::milliseconds(999));
        assert!(!tracker.is_currently_expired().await.unwrap());
        clock.set(at(160));
        assert!(tracker.is_currently_expired().await.unwrap());
    }

    #[tokio::test]
    async fn peek_never_resets() {
        let (store, _, tracker) = setup(TrackerConfig::default());
        assert_eq!(tracker.peek().await.unwrap(), 0);
        assert_eq!(store.writes(), 0);
        assert!(!tracker.has_state().await.unwrap());
    }

    #[tokio::test]
    async fn clear_removes_state_and_forces_reset() {
        let (store, _, tracker) = setup(TrackerConfig::default());
        tracker.get().await.unwrap();
        assert!(tracker.has_state().await.unwrap());

        tracker.clear().await.unwrap();
        assert!(!tracker.has_state().await.unwrap());
        assert!(store.is_empty());
        assert!(tracker.is_currently_expired().await.unwrap());

        tracker.get().await.unwrap();
        assert_eq!(tracker.policy().resets.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn time_since_last_update() {
        let (_, clock, tracker) = setup(TrackerConfig::default());
        assert_eq!(tracker.time_since_last_update().await.unwrap(), None);
        tracker.get().await.unwrap();
        clock.advance(Duration::seconds(12));
        assert_eq!(
            tracker.time_since_last_update().await.unwrap(),
            Some(Duration::seconds(12))
        );
    }

    #[tokio::test]
    async fn isolated_tracker_sees_external_timestamp_writes() {
        let (store, clock, tracker) = setup(TrackerConfig::default().isolated());
        tracker.get().await.unwrap();
        clock.set(at(30));
        // Another context refreshed the timestamp long ago.
        store
            .write("score_last_tracker", RawValue::Int(-3_600_000))
            .await
            .unwrap();
        assert!(tracker.is_currently_expired().await.unwrap());
    }

    #[tokio::test]
    async fn failed_value_write_changes_nothing() {
        let (store, clock, tracker) = setup(TrackerConfig::default().isolated());
        store.write("score_tracker", RawValue::Int(7)).await.unwrap();
        store.write("score_last_tracker", RawValue::Int(0)).await.unwrap();
        clock.set(at(120));

        store.fail_next(StoreOp::Write);
        assert!(matches!(
            tracker.get().await,
            Err(TrackerError::Prf(PrfError::Store(_)))
        ));
        assert_eq!(store.snapshot("score_tracker"), Some(RawValue::Int(7)));
        assert_eq!(store.snapshot("score_last_tracker"), Some(RawValue::Int(0)));
    }

    #[tokio::test]
    async fn failed_timestamp_write_rolls_back_value() {
        let (store, clock, tracker) = setup(TrackerConfig::default());
        store.write("score_tracker", RawValue::Int(7)).await.unwrap();
        store.write("score_last_tracker", RawValue::Int(0)).await.unwrap();
        clock.set(at(120));

        store.fail_next_write_to("score_last_tracker");
        assert!(tracker.get().await.is_err());
        assert_eq!(store.snapshot("score_tracker"), Some(RawValue::Int(7)));
        assert_eq!(store.snapshot("score_last_tracker"), Some(RawValue::Int(0)));
        assert_eq!(tracker.peek().await.unwrap(), 7);

        // The next attempt goes through.
        assert_eq!(tracker.get().await.unwrap(), 42);
        assert_eq!(tracker.last_update_time().await.unwrap(), Some(at(120)));
    }

    #[tokio::test]
    async fn failed_first_reset_removes_value_again() {
        let (store, _, tracker) = setup(TrackerConfig::default());
        store.fail_next_write_to("score_last_tracker");
        assert!(tracker.get().await.is_err());
        assert!(!tracker.has_state().await.unwrap());
    }

    #[tokio::test]
    async fn reset_overwrites_undecodable_value() {
        let (store, _, tracker) = setup(TrackerConfig::default());
        store
            .write("score_tracker", RawValue::from("garbage"))
            .await
            .unwrap();
        tracker.reset().await.unwrap();
        assert_eq!(store.snapshot("score_tracker"), Some(RawValue::Int(42)));
        assert_eq!(tracker.get().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn stale_get_replaces_undecodable_value() {
        let (store, _, tracker) = setup(TrackerConfig::default().isolated());
        store
            .write("score_tracker", RawValue::from("garbage"))
            .await
            .unwrap();
        assert_eq!(tracker.get().await.unwrap(), 42);
        assert_eq!(store.snapshot("score_last_tracker"), Some(RawValue::Int(0)));
    }

    #[tokio::test]
    async fn failed_reset_over_undecodable_value_removes_it() {
        let (store, _, tracker) = setup(TrackerConfig::default());
        store
            .write("score_tracker", RawValue::from("garbage"))
            .await
            .unwrap();
        store.fail_next_write_to("score_last_tracker");
        assert!(tracker.reset().await.is_err());
        assert_eq!(store.snapshot("score_tracker"), None);
        assert_eq!(store.snapshot("score_last_tracker"), None);
    }

    #[test]
    fn debug_lists_keys_and_policy() {
        let (_, _, tracker) = setup(TrackerConfig::default());
        let debug = format!("{tracker:?}");
        assert!(debug.contains("score_tracker"));
        assert!(debug.contains("score_last_tracker"));
        assert!(debug.contains("FortyTwo"));
    }

    #[tokio::test]
    async fn decode_mismatch_surfaces_from_get() {
        let (store, _, tracker) = setup(TrackerConfig::default().isolated());
        store
            .write("score_last_tracker", RawValue::from("yesterday"))
            .await
            .unwrap();
        let err = tracker.get().await.unwrap_err();
        assert!(matches!(err, TrackerError::Prf(ref e) if e.is_decode()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_gets_reset_exactly_once() {
        let store = Arc::new(InMemoryPrefStore::yielding());
        let clock = Arc::new(ManualClock::at_epoch());
        let tracker = Arc::new(
            BaseTracker::<i64, _>::new(store, "score", TrackerConfig::default(), FortyTwo::default())
                .unwrap()
                .with_clock(clock),
        );

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                tokio::spawn(async move { tracker.get().await.unwrap() })
            })
            .collect();
        for h in handles {
            assert_eq!(h.await.unwrap(), 42);
        }
        assert_eq!(tracker.policy().resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_suffix_is_rejected() {
        let store = Arc::new(InMemoryPrefStore::new());
        let result = BaseTracker::<i64, _>::new(
            store,
            "score",
            TrackerConfig::new(""),
            TtlPolicy::new(Duration::seconds(1)),
        );
        assert!(matches!(result, Err(TrackerError::InvalidConfig(_))));
    }
}
