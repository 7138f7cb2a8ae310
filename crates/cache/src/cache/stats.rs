//! Cache statistics and metrics tracking
//!
//! Counters are kept in atomics so lookups and background refreshes can
//! record events without contending on a lock. [`CacheStats`] is a
//! point-in-time copy for reporting.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of cache activity counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of entries
    pub size: usize,

    /// Lookups answered from a fresh entry
    pub fresh_hits: u64,

    /// Lookups answered from a stale entry inside the stale window
    pub stale_hits: u64,

    /// Lookups for keys with no entry
    pub misses: u64,

    /// Source calls made on the caller's thread
    pub sync_fetches: u64,

    /// Background refreshes admitted to the worker pool
    pub async_refreshes_scheduled: u64,

    /// Background refreshes skipped because one was already in flight
    pub async_refreshes_skipped: u64,

    /// Background refreshes that stored a new value
    pub async_refreshes_completed: u64,

    /// Source calls that returned an error
    pub fetch_failures: u64,

    /// Synchronous refresh failures answered with the stale value
    pub stale_fallbacks: u64,

    /// Explicit `put` calls
    pub puts: u64,
}

impl CacheStats {
    /// Lookups answered from an existing entry without waiting on the source
    pub const fn hits(&self) -> u64 {
        self.fresh_hits + self.stale_hits
    }

    /// Total number of lookups classified by the cache
    pub const fn total_lookups(&self) -> u64 {
        self.fresh_hits + self.stale_hits + self.misses + self.sync_refreshes()
    }

    /// Lookups that refreshed a stale-beyond-window entry synchronously
    pub const fn sync_refreshes(&self) -> u64 {
        self.sync_fetches.saturating_sub(self.misses)
    }

    /// Share of lookups answered without waiting on the source
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_lookups();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Share of synchronous refreshes that fell back to stale data
    #[allow(clippy::cast_precision_loss)]
    pub fn fallback_rate(&self) -> f64 {
        let refreshes = self.sync_refreshes();
        if refreshes == 0 {
            0.0
        } else {
            self.stale_fallbacks as f64 / refreshes as f64
        }
    }
}

/// Thread-safe collector behind [`CacheStats`]
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    fresh_hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    sync_fetches: AtomicU64,
    async_refreshes_scheduled: AtomicU64,
    async_refreshes_skipped: AtomicU64,
    async_refreshes_completed: AtomicU64,
    fetch_failures: AtomicU64,
    stale_fallbacks: AtomicU64,
    puts: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_fresh_hit(&self) {
        self.fresh_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_stale_hit(&self) {
        self.stale_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sync_fetch(&self) {
        self.sync_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh_scheduled(&self) {
        self.async_refreshes_scheduled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh_skipped(&self) {
        self.async_refreshes_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_refresh_completed(&self) {
        self.async_refreshes_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fallback(&self) {
        self.stale_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, size: usize) -> CacheStats {
        CacheStats {
            size,
            fresh_hits: self.fresh_hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sync_fetches: self.sync_fetches.load(Ordering::Relaxed),
            async_refreshes_scheduled: self.async_refreshes_scheduled.load(Ordering::Relaxed),
            async_refreshes_skipped: self.async_refreshes_skipped.load(Ordering::Relaxed),
            async_refreshes_completed: self.async_refreshes_completed.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            stale_fallbacks: self.stale_fallbacks.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
        }
    }
}
