//! Refresh-ahead cache orchestration
//!
//! [`FaultTolerantCache`] classifies every lookup by the age of the stored
//! entry and picks one of four actions:
//!
//! | State         | Action                                   |
//! |---------------|------------------------------------------|
//! | `Absent`      | fetch on the caller's thread             |
//! | `Fresh`       | serve the cached value                   |
//! | `StaleAsync`  | serve the cached value, refresh behind   |
//! | `StaleSync`   | fetch now, fall back to the old value    |
//!
//! Background refreshes are admitted through a [`SingleFetchTracker`] so a
//! key has at most one in flight, and they run on a bounded worker pool.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use super::config::CacheParameters;
use super::entry::{CacheEntry, EntryState};
use super::executor::RefreshExecutor;
use super::stats::{CacheStats, MetricsCollector};
use super::tracker::SingleFetchTracker;
use crate::clock::{Clock, SystemClock};
use crate::error::{BoxedError, CacheError, CacheResult};

/// Lookup function backing a cache
///
/// `Ok(None)` means the source has no value for the key; it is not an error
/// and is never cached. Implementations may block.
pub trait Source<K, V>: Send + Sync + 'static {
    /// Fetch the current value for `key`
    fn fetch(&self, key: &K) -> Result<Option<V>, BoxedError>;
}

impl<K, V, F> Source<K, V> for F
where
    F: Fn(&K) -> Result<Option<V>, BoxedError> + Send + Sync + 'static,
{
    fn fetch(&self, key: &K) -> Result<Option<V>, BoxedError> {
        self(key)
    }
}

/// Pin a closure to the [`Source`] signature so its argument and error types
/// are inferred
///
/// ```
/// use refreshahead_cache::cache::source_fn;
///
/// let source = source_fn(|key: &String| Ok(Some(key.len())));
/// # let _ = source;
/// ```
pub fn source_fn<K, V, F>(f: F) -> F
where
    F: Fn(&K) -> Result<Option<V>, BoxedError> + Send + Sync + 'static,
{
    f
}

/// Classification of a key at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyState {
    /// No entry stored
    Absent,
    /// Entry younger than the freshness window
    Fresh,
    /// Entry between the freshness and stale windows
    StaleAsync,
    /// Entry older than the stale window
    StaleSync,
}

impl From<EntryState> for KeyState {
    fn from(state: EntryState) -> Self {
        match state {
            EntryState::Fresh => Self::Fresh,
            EntryState::StaleAsync => Self::StaleAsync,
            EntryState::StaleSync => Self::StaleSync,
        }
    }
}

/// State shared by every handle of a cache and by its background refreshes
struct Shared<K, V, C>
where
    K: Eq + Hash,
{
    store: DashMap<K, CacheEntry<V>>,
    tracker: SingleFetchTracker<K>,
    source: Box<dyn Source<K, V>>,
    params: CacheParameters<K>,
    clock: C,
    metrics: MetricsCollector,
}

impl<K, V, C> Shared<K, V, C>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    fn store_value(&self, key: K, value: V) {
        let entry = CacheEntry::new(
            value,
            self.clock.now(),
            self.params.freshness_window(),
            self.params.stale_window(),
        );
        self.store.insert(key, entry);
    }

    fn report_failure(&self, key: &K, error: &BoxedError) {
        self.metrics.record_failure();
        warn!(key = ?key, error = %error, "source fetch failed");
        self.params.notify_failure(key, error);
    }

    /// Synchronous fetch; stores and returns the value on success
    fn fetch_and_store(&self, key: &K) -> Result<Option<V>, BoxedError> {
        self.metrics.record_sync_fetch();
        let fetched = self.source.fetch(key)?;
        if let Some(value) = &fetched {
            self.store_value(key.clone(), value.clone());
        }
        Ok(fetched)
    }

    #[instrument(level = "debug", skip_all, fields(key = ?key))]
    fn refresh_in_background(&self, key: &K) {
        match self.source.fetch(key) {
            Ok(Some(value)) => {
                self.store_value(key.clone(), value);
                self.metrics.record_refresh_completed();
                debug!("background refresh stored new value");
            }
            Ok(None) => debug!("source returned no value; keeping cached entry"),
            Err(error) => self.report_failure(key, &error),
        }
    }
}

/// A background refresh admitted by the tracker
///
/// Owns its tracker marker and releases it on drop: after running, while
/// unwinding from a panicking source, or when the worker pool discards the
/// task without running it.
struct RefreshTask<K, V, C>
where
    K: Eq + Hash,
{
    shared: Arc<Shared<K, V, C>>,
    key: K,
    marked_at: Instant,
    started: bool,
}

impl<K, V, C> RefreshTask<K, V, C>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    fn run(mut self) {
        self.started = true;
        self.shared.refresh_in_background(&self.key);
    }
}

impl<K, V, C> Drop for RefreshTask<K, V, C>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if !self.started {
            debug!("background refresh discarded before running; releasing key");
        }
        self.shared.tracker.release_if_marked_at(&self.key, self.marked_at);
    }
}

/// Read-through cache that refreshes ahead of expiry and serves stale data
/// when the source fails
///
/// Handles are cheap to clone and share the store, tracker, statistics and
/// worker pool. The owned worker pool shuts down when the last handle drops.
///
/// # Type Parameters
/// - `K`: Key type
/// - `V`: Value type, cloned out on every hit
/// - `C`: Clock type (defaults to `SystemClock`)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use refreshahead_cache::cache::{source_fn, CacheParameters, FaultTolerantCache};
///
/// let params = CacheParameters::new(Duration::from_secs(300), Duration::from_secs(1200));
/// let cache = FaultTolerantCache::new(
///     source_fn(|key: &String| Ok(Some(key.to_uppercase()))),
///     params,
/// )
/// .unwrap();
///
/// assert_eq!(cache.get(&"a".to_string()).unwrap(), Some("A".to_string()));
/// assert_eq!(cache.get_if_present(&"a".to_string()), Some("A".to_string()));
/// ```
pub struct FaultTolerantCache<K, V, C = SystemClock>
where
    K: Eq + Hash,
{
    shared: Arc<Shared<K, V, C>>,
    executor: Arc<RefreshExecutor>,
}

impl<K, V> FaultTolerantCache<K, V, SystemClock>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache on the system clock with its own worker pool
    pub fn new<S>(source: S, params: CacheParameters<K>) -> CacheResult<Self>
    where
        S: Source<K, V>,
    {
        Self::with_clock(source, params, SystemClock)
    }
}

impl<K, V, C> FaultTolerantCache<K, V, C>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    C: Clock,
{
    /// Create a cache with a custom clock (useful for testing)
    pub fn with_clock<S>(source: S, params: CacheParameters<K>, clock: C) -> CacheResult<Self>
    where
        S: Source<K, V>,
    {
        params.settings().validate()?;
        let executor = RefreshExecutor::new(params.refresh_workers())?;
        Ok(Self::assemble(Box::new(source), params, clock, executor))
    }

    /// Create a cache whose background refreshes run on an existing runtime
    ///
    /// Refreshes submitted after that runtime shuts down are discarded and
    /// their keys released, so lookups keep serving cached values.
    pub fn with_runtime<S>(
        source: S,
        params: CacheParameters<K>,
        clock: C,
        handle: Handle,
    ) -> CacheResult<Self>
    where
        S: Source<K, V>,
    {
        params.settings().validate()?;
        let executor = RefreshExecutor::with_handle(handle, params.refresh_workers());
        Ok(Self::assemble(Box::new(source), params, clock, executor))
    }

    fn assemble(
        source: Box<dyn Source<K, V>>,
        params: CacheParameters<K>,
        clock: C,
        executor: RefreshExecutor,
    ) -> Self {
        let shared = Shared {
            store: DashMap::new(),
            tracker: SingleFetchTracker::new(params.refresh_lock_timeout()),
            source,
            params,
            clock,
            metrics: MetricsCollector::new(),
        };
        Self { shared: Arc::new(shared), executor: Arc::new(executor) }
    }

    /// Look up `key`, fetching or refreshing according to the entry's age
    ///
    /// Returns `Ok(None)` when the source has no value for an uncached key.
    ///
    /// # Errors
    /// [`CacheError::SourceFailure`] when the key has no entry and the source
    /// fails. Failures for keys with an entry are absorbed: the observer is
    /// notified and the cached value is returned.
    #[instrument(level = "debug", skip_all, fields(key = ?key))]
    pub fn get(&self, key: &K) -> CacheResult<Option<V>> {
        let now = self.shared.clock.now();
        let cached = self.shared.store.get(key).map(|entry| entry.value().clone());

        let Some(entry) = cached else {
            self.shared.metrics.record_miss();
            debug!("no cached entry; fetching");
            return self.shared.fetch_and_store(key).map_err(|error| {
                self.shared.report_failure(key, &error);
                CacheError::source_failure(key, error)
            });
        };

        match entry.state(now) {
            EntryState::Fresh => {
                self.shared.metrics.record_fresh_hit();
                Ok(Some(entry.into_value()))
            }
            EntryState::StaleAsync => {
                self.shared.metrics.record_stale_hit();
                self.schedule_refresh(key, now);
                Ok(Some(entry.into_value()))
            }
            EntryState::StaleSync => {
                debug!(age = ?entry.age(now), "entry past stale window; refreshing");
                match self.shared.fetch_and_store(key) {
                    Ok(Some(value)) => Ok(Some(value)),
                    Ok(None) => {
                        debug!("source returned no value; keeping cached entry");
                        Ok(None)
                    }
                    Err(error) => {
                        self.shared.report_failure(key, &error);
                        self.shared.metrics.record_fallback();
                        warn!(key = ?key, "serving stale value after failed refresh");
                        Ok(Some(entry.into_value()))
                    }
                }
            }
        }
    }

    fn schedule_refresh(&self, key: &K, now: Instant) {
        if !self.shared.tracker.try_acquire(key.clone(), now) {
            self.shared.metrics.record_refresh_skipped();
            debug!("background refresh already in flight");
            return;
        }

        self.shared.metrics.record_refresh_scheduled();
        debug!("scheduling background refresh");
        let task = RefreshTask {
            shared: Arc::clone(&self.shared),
            key: key.clone(),
            marked_at: now,
            started: false,
        };
        self.executor.submit(move || task.run());
    }

    /// Store `value` for `key` as a freshly fetched entry
    pub fn put(&self, key: K, value: V) {
        self.shared.metrics.record_put();
        self.shared.store_value(key, value);
    }

    /// Cached value for `key` regardless of age; never calls the source
    pub fn get_if_present(&self, key: &K) -> Option<V> {
        self.shared.store.get(key).map(|entry| entry.value().value().clone())
    }

    /// Cached values for every key in `keys` that has an entry
    pub fn get_present<'a, I>(&self, keys: I) -> HashMap<K, V>
    where
        I: IntoIterator<Item = &'a K>,
    {
        keys.into_iter()
            .filter_map(|key| self.get_if_present(key).map(|value| (key.clone(), value)))
            .collect()
    }

    /// Like [`get_present`](Self::get_present), restricted to fresh entries
    pub fn get_present_fresh<'a, I>(&self, keys: I) -> HashMap<K, V>
    where
        I: IntoIterator<Item = &'a K>,
    {
        let now = self.shared.clock.now();
        keys.into_iter()
            .filter_map(|key| {
                let entry = self.shared.store.get(key)?;
                entry.is_fresh(now).then(|| (key.clone(), entry.value().value().clone()))
            })
            .collect()
    }

    /// A copy of the stored entry for `key`
    pub fn entry(&self, key: &K) -> Option<CacheEntry<V>> {
        self.shared.store.get(key).map(|entry| entry.value().clone())
    }

    /// Classify `key` at the clock's current instant
    pub fn state(&self, key: &K) -> KeyState {
        let now = self.shared.clock.now();
        self.shared.store.get(key).map_or(KeyState::Absent, |entry| entry.state(now).into())
    }

    /// Whether a background refresh of `key` currently holds its lock
    pub fn is_refreshing(&self, key: &K) -> bool {
        self.shared.tracker.is_locked(key, self.shared.clock.now())
    }

    /// Number of background refreshes running right now
    pub fn active_refreshes(&self) -> usize {
        self.executor.active()
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.shared.store.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.shared.store.is_empty()
    }

    /// Snapshot of the cache's counters
    pub fn stats(&self) -> CacheStats {
        self.shared.metrics.snapshot(self.len())
    }

    /// The parameters the cache was built with
    pub fn parameters(&self) -> &CacheParameters<K> {
        &self.shared.params
    }
}

impl<K, V, C> Clone for FaultTolerantCache<K, V, C>
where
    K: Eq + Hash,
{
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), executor: Arc::clone(&self.executor) }
    }
}

impl<K, V, C> fmt::Debug for FaultTolerantCache<K, V, C>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FaultTolerantCache")
            .field("len", &self.shared.store.len())
            .field("parameters", &self.shared.params)
            .field("refresh_workers", &self.executor.max_workers())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::clock::MockClock;
    use crate::testing::{wait_until, ScriptedSource};

    const FIVE_MINUTES: Duration = Duration::from_secs(5 * 60);
    const TWENTY_MINUTES: Duration = Duration::from_secs(20 * 60);
    const WAIT: Duration = Duration::from_secs(5);

    type TestCache = FaultTolerantCache<String, u32, MockClock>;

    fn key(name: &str) -> String {
        name.to_string()
    }

    fn cache_with(
        source: &ScriptedSource<String, u32>,
        clock: &MockClock,
        failures: &Arc<AtomicUsize>,
    ) -> TestCache {
        let failures = Arc::clone(failures);
        let params = CacheParameters::builder()
            .freshness_window(FIVE_MINUTES)
            .stale_window(TWENTY_MINUTES)
            .refresh_workers(2)
            .on_fetch_failure(move |_, _| {
                failures.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();
        FaultTolerantCache::with_clock(source.clone(), params, clock.clone()).unwrap()
    }

    #[test]
    fn test_absent_fetches_and_stores() {
        let source = ScriptedSource::new();
        source.set_value(key("A"), 7);
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        assert_eq!(cache.get(&key("A")).unwrap(), Some(7));
        assert_eq!(source.calls(&key("A")), 1);
        assert_eq!(cache.state(&key("A")), KeyState::Fresh);
        assert_eq!(cache.entry(&key("A")).unwrap().fetched_at(), clock.now());

        assert_eq!(cache.get(&key("A")).unwrap(), Some(7));
        assert_eq!(source.calls(&key("A")), 1);
    }

    #[test]
    fn test_absent_failure_propagates_and_notifies() {
        let source = ScriptedSource::new();
        source.fail_with("connection refused");
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        let err = cache.get(&key("A")).unwrap_err();
        assert!(matches!(err, CacheError::SourceFailure { .. }));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.key(), Some("\"A\""));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_absent_source_miss_returns_none() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        assert_eq!(cache.get(&key("missing")).unwrap(), None);
        assert_eq!(cache.state(&key("missing")), KeyState::Absent);
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stale_sync_refreshes_on_caller_thread() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        source.set_value(key("A"), 2);
        clock.advance(Duration::from_secs(25 * 60));

        assert_eq!(cache.state(&key("A")), KeyState::StaleSync);
        assert_eq!(cache.get(&key("A")).unwrap(), Some(2));
        assert_eq!(cache.state(&key("A")), KeyState::Fresh);
        assert_eq!(source.total_calls(), 1);
    }

    #[test]
    fn test_stale_sync_failure_falls_back() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        source.fail_with("timeout");
        clock.advance(Duration::from_secs(30 * 60));

        assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        // The failed refresh leaves the old entry in place.
        assert_eq!(cache.state(&key("A")), KeyState::StaleSync);

        let stats = cache.stats();
        assert_eq!(stats.stale_fallbacks, 1);
        assert_eq!(stats.fetch_failures, 1);
    }

    #[test]
    fn test_stale_sync_source_miss_keeps_entry() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        clock.advance(Duration::from_secs(30 * 60));

        assert_eq!(cache.get(&key("A")).unwrap(), None);
        assert_eq!(cache.get_if_present(&key("A")), Some(1));
        assert_eq!(failures.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stale_async_serves_cached_and_refreshes() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        source.set_value(key("A"), 2);
        clock.advance(Duration::from_secs(10 * 60));

        assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        assert!(wait_until(WAIT, || cache.get_if_present(&key("A")) == Some(2)));
        assert!(wait_until(WAIT, || !cache.is_refreshing(&key("A"))));
        assert_eq!(cache.state(&key("A")), KeyState::Fresh);
        assert_eq!(cache.stats().async_refreshes_completed, 1);
    }

    #[test]
    fn test_stale_async_failure_keeps_entry_and_notifies() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        source.fail_with("unavailable");
        clock.advance(Duration::from_secs(10 * 60));

        assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        assert!(wait_until(WAIT, || failures.load(Ordering::SeqCst) == 1));
        assert!(wait_until(WAIT, || !cache.is_refreshing(&key("A"))));
        assert_eq!(cache.get_if_present(&key("A")), Some(1));
        assert_eq!(cache.state(&key("A")), KeyState::StaleAsync);
    }

    #[test]
    fn test_stale_async_admits_one_refresh_per_key() {
        let source = ScriptedSource::new();
        source.set_value(key("A"), 2);
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        clock.advance(Duration::from_secs(10 * 60));
        source.hold();

        for _ in 0..5 {
            assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        }
        assert!(wait_until(WAIT, || source.in_flight() == 1));
        assert!(cache.is_refreshing(&key("A")));

        source.release();
        assert!(wait_until(WAIT, || cache.get_if_present(&key("A")) == Some(2)));
        assert_eq!(source.calls(&key("A")), 1);

        let stats = cache.stats();
        assert_eq!(stats.async_refreshes_scheduled, 1);
        assert_eq!(stats.async_refreshes_skipped, 4);
        assert_eq!(stats.stale_hits, 5);
    }

    #[test]
    fn test_refresh_on_shut_down_runtime_releases_key() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let source = ScriptedSource::new();
        source.set_value(key("A"), 2);
        let clock = MockClock::new();
        let params = CacheParameters::builder()
            .freshness_window(FIVE_MINUTES)
            .stale_window(TWENTY_MINUTES)
            .refresh_lock_timeout(Duration::from_secs(3600))
            .build()
            .unwrap();
        let cache =
            FaultTolerantCache::with_runtime(source.clone(), params, clock.clone(), handle).unwrap();

        cache.put(key("A"), 1);
        clock.advance(Duration::from_secs(10 * 60));

        assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        assert!(wait_until(WAIT, || !cache.is_refreshing(&key("A"))));

        // The next stale read is admitted again instead of waiting out the lock.
        assert_eq!(cache.get(&key("A")).unwrap(), Some(1));
        assert!(wait_until(WAIT, || !cache.is_refreshing(&key("A"))));
        let stats = cache.stats();
        assert_eq!(stats.async_refreshes_scheduled, 2);
        assert_eq!(stats.async_refreshes_skipped, 0);
        assert_eq!(source.total_calls(), 0);
        assert_eq!(cache.get_if_present(&key("A")), Some(1));
    }

    #[test]
    fn test_put_resets_freshness() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("A"), 1);
        clock.advance(Duration::from_secs(30 * 60));
        cache.put(key("A"), 3);

        assert_eq!(cache.state(&key("A")), KeyState::Fresh);
        assert_eq!(cache.get(&key("A")).unwrap(), Some(3));
        assert_eq!(source.total_calls(), 0);
        assert_eq!(cache.stats().puts, 2);
    }

    #[test]
    fn test_get_present_and_fresh_subset() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);

        cache.put(key("old"), 1);
        clock.advance(Duration::from_secs(10 * 60));
        cache.put(key("new"), 2);

        let keys = [key("old"), key("new"), key("absent")];
        let present = cache.get_present(&keys);
        let fresh = cache.get_present_fresh(&keys);

        assert_eq!(present.len(), 2);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh.get("new"), Some(&2));
        assert!(fresh.iter().all(|(k, v)| present.get(k) == Some(v)));
        assert_eq!(source.total_calls(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);
        let other = cache.clone();

        cache.put(key("A"), 1);

        assert_eq!(other.get_if_present(&key("A")), Some(1));
        assert_eq!(other.len(), 1);
        assert_eq!(other.stats().puts, 1);
    }

    #[test]
    fn test_rejects_zero_workers() {
        let settings = crate::cache::RefreshSettings {
            refresh_workers: 0,
            ..crate::cache::RefreshSettings::new(FIVE_MINUTES, TWENTY_MINUTES)
        };
        let params = CacheParameters::<String>::from_settings(settings);
        assert!(params.is_err());
    }

    #[test]
    fn test_debug_output() {
        let source = ScriptedSource::new();
        let clock = MockClock::new();
        let failures = Arc::new(AtomicUsize::new(0));
        let cache = cache_with(&source, &clock, &failures);
        cache.put(key("A"), 1);

        let rendered = format!("{cache:?}");
        assert!(rendered.contains("len: 1"));
        assert!(rendered.contains("refresh_workers: 2"));
    }

    #[test]
    fn test_closure_source() {
        let params = CacheParameters::new(FIVE_MINUTES, TWENTY_MINUTES);
        let cache =
            FaultTolerantCache::new(source_fn(|key: &u64| Ok(Some(key * 2))), params).unwrap();

        assert_eq!(cache.get(&21).unwrap(), Some(42));
        assert_eq!(cache.parameters().freshness_window(), FIVE_MINUTES);
    }
}
