//! Dated cache entries
//!
//! A [`CacheEntry`] pairs a fetched value with the instant it was fetched and
//! the two refresh deadlines derived from the cache's windows. Entries are
//! immutable; every successful fetch replaces the stored entry wholesale.

use std::time::{Duration, Instant};

/// Freshness classification of an existing entry at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    /// Younger than the freshness window; served as-is
    Fresh,
    /// Past the freshness window but inside the stale window; served while a
    /// background refresh is attempted
    StaleAsync,
    /// Past the stale window; refreshed synchronously before serving
    StaleSync,
}

/// A value together with its fetch time and refresh deadlines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    // `None` when the deadline lies beyond what `Instant` can represent.
    next_async_refresh_at: Option<Instant>,
    next_sync_refresh_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    /// Create an entry fetched at `fetched_at`
    pub fn new(
        value: V,
        fetched_at: Instant,
        freshness_window: Duration,
        stale_window: Duration,
    ) -> Self {
        Self {
            value,
            fetched_at,
            next_async_refresh_at: fetched_at.checked_add(freshness_window),
            next_sync_refresh_at: fetched_at.checked_add(stale_window),
        }
    }

    /// The cached value
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// Consume the entry, returning the value
    pub fn into_value(self) -> V {
        self.value
    }

    /// When the value was fetched
    pub const fn fetched_at(&self) -> Instant {
        self.fetched_at
    }

    /// Instant from which a lookup schedules a background refresh
    pub const fn next_async_refresh_at(&self) -> Option<Instant> {
        self.next_async_refresh_at
    }

    /// Instant from which a lookup refreshes synchronously
    pub const fn next_sync_refresh_at(&self) -> Option<Instant> {
        self.next_sync_refresh_at
    }

    /// Age of the entry at `now`, zero if `now` precedes the fetch
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.fetched_at)
    }

    /// Whether the entry is still inside its freshness window
    pub fn is_fresh(&self, now: Instant) -> bool {
        self.next_async_refresh_at.map_or(true, |deadline| now < deadline)
    }

    /// Whether the entry may still be served without a synchronous refresh
    pub fn is_within_sync_window(&self, now: Instant) -> bool {
        self.next_sync_refresh_at.map_or(true, |deadline| now < deadline)
    }

    /// Classify the entry at `now`
    pub fn state(&self, now: Instant) -> EntryState {
        if self.is_fresh(now) {
            EntryState::Fresh
        } else if self.is_within_sync_window(now) {
            EntryState::StaleAsync
        } else {
            EntryState::StaleSync
        }
    }
}
