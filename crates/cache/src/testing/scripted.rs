//! Programmable [`Source`] for exercising cache behavior
//!
//! [`ScriptedSource`] serves values from an in-memory table, counts calls per
//! key, can be switched into a failing mode, and can hold fetches at a gate
//! so tests observe a refresh while it is in flight.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::cache::Source;
use crate::error::BoxedError;

#[derive(Debug)]
struct Script<K, V> {
    values: HashMap<K, V>,
    calls: HashMap<K, usize>,
    failure: Option<String>,
    held: bool,
    in_flight: usize,
}

#[derive(Debug)]
struct Inner<K, V> {
    script: Mutex<Script<K, V>>,
    gate: Condvar,
}

/// Scriptable source; clones share the same script
///
/// # Example
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use refreshahead_cache::cache::Source;
/// use refreshahead_cache::testing::ScriptedSource;
///
/// let source = ScriptedSource::new();
/// source.set_value("a", 1);
///
/// assert_eq!(source.fetch(&"a").unwrap(), Some(1));
/// assert_eq!(source.fetch(&"b").unwrap(), None);
///
/// source.fail_with("backend down");
/// assert!(source.fetch(&"a").is_err());
/// assert_eq!(source.calls(&"a"), 2);
/// # }
/// ```
#[derive(Debug)]
pub struct ScriptedSource<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for ScriptedSource<K, V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<K, V> Default for ScriptedSource<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ScriptedSource<K, V> {
    /// Source with no values that answers every key with `None`
    pub fn new() -> Self {
        let script = Script {
            values: HashMap::new(),
            calls: HashMap::new(),
            failure: None,
            held: false,
            in_flight: 0,
        };
        Self { inner: Arc::new(Inner { script: Mutex::new(script), gate: Condvar::new() }) }
    }

    /// Fail every fetch with `message` until [`succeed`](Self::succeed)
    pub fn fail_with(&self, message: impl Into<String>) {
        self.inner.script.lock().failure = Some(message.into());
    }

    /// Stop failing
    pub fn succeed(&self) {
        self.inner.script.lock().failure = None;
    }

    /// Hold every fetch at the gate until [`release`](Self::release)
    pub fn hold(&self) {
        self.inner.script.lock().held = true;
    }

    /// Open the gate and let held fetches complete
    pub fn release(&self) {
        self.inner.script.lock().held = false;
        self.inner.gate.notify_all();
    }

    /// Number of fetches currently inside the source
    pub fn in_flight(&self) -> usize {
        self.inner.script.lock().in_flight
    }

    /// Total fetches across all keys
    pub fn total_calls(&self) -> usize {
        self.inner.script.lock().calls.values().sum()
    }
}

impl<K, V> ScriptedSource<K, V>
where
    K: Eq + Hash,
{
    /// Serve `value` for `key` from now on
    pub fn set_value(&self, key: K, value: V) {
        self.inner.script.lock().values.insert(key, value);
    }

    /// Answer `key` with `None` from now on
    pub fn remove_value(&self, key: &K) {
        self.inner.script.lock().values.remove(key);
    }

    /// Fetches made for `key`
    pub fn calls(&self, key: &K) -> usize {
        self.inner.script.lock().calls.get(key).copied().unwrap_or(0)
    }
}

impl<K, V> Source<K, V> for ScriptedSource<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fetch(&self, key: &K) -> Result<Option<V>, BoxedError> {
        let mut script = self.inner.script.lock();
        *script.calls.entry(key.clone()).or_insert(0) += 1;

        script.in_flight += 1;
        while script.held {
            self.inner.gate.wait(&mut script);
        }
        script.in_flight -= 1;

        if let Some(message) = &script.failure {
            return Err(message.clone().into());
        }
        Ok(script.values.get(key).cloned())
    }
}
