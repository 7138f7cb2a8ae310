//! Single-flight admission for background refreshes
//!
//! [`SingleFetchTracker`] records, per key, when a background refresh was
//! admitted. A key stays locked until the refresh releases it or until the
//! lock timeout elapses, whichever comes first. The timeout keeps a hung or
//! crashed refresh from blocking a key forever; the price is that a very slow
//! refresh may overlap with the next one.
//!
//! A refresh finishing after its marker was overwritten must not clear the
//! newer marker, so refresh tasks release with
//! [`SingleFetchTracker::release_if_marked_at`] rather than by key alone.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Per-key marker map guarding background refreshes
#[derive(Debug)]
pub struct SingleFetchTracker<K>
where
    K: Eq + Hash,
{
    markers: Mutex<HashMap<K, Instant>>,
    lock_timeout: Duration,
}

impl<K> SingleFetchTracker<K>
where
    K: Eq + Hash,
{
    /// Create a tracker whose markers expire after `lock_timeout`
    pub fn new(lock_timeout: Duration) -> Self {
        Self { markers: Mutex::new(HashMap::new()), lock_timeout }
    }

    /// Lock timeout applied to every marker
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    /// Try to mark `key` as being fetched at `now`
    ///
    /// Returns `true` and records the marker when the key has no marker or
    /// only an expired one. Returns `false` while a live marker exists.
    pub fn try_acquire(&self, key: K, now: Instant) -> bool {
        let mut markers = self.markers.lock();
        if let Some(marked_at) = markers.get(&key) {
            if self.is_live(*marked_at, now) {
                return false;
            }
        }
        markers.insert(key, now);
        true
    }

    /// Remove the marker for `key`, returning whether one was present
    pub fn release(&self, key: &K) -> bool {
        self.markers.lock().remove(key).is_some()
    }

    /// Whether `key` holds a live marker at `now`
    pub fn is_locked(&self, key: &K, now: Instant) -> bool {
        self.markers.lock().get(key).is_some_and(|marked_at| self.is_live(*marked_at, now))
    }

    /// Number of markers held, expired ones included
    pub fn len(&self) -> usize {
        self.markers.lock().len()
    }

    /// Whether no markers are held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove the marker for `key` only if it was set at `marked_at`
    ///
    /// Returns `false` when the marker is gone or belongs to a later
    /// acquisition, which is then left in place.
    pub fn release_if_marked_at(&self, key: &K, marked_at: Instant) -> bool {
        let mut markers = self.markers.lock();
        if markers.get(key) == Some(&marked_at) {
            markers.remove(key);
            true
        } else {
            false
        }
    }

    fn is_live(&self, marked_at: Instant, now: Instant) -> bool {
        marked_at.checked_add(self.lock_timeout).map_or(true, |expires_at| now < expires_at)
    }
}
