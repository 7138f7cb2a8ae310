//! Cache parameters, settings and builder
//!
//! [`CacheParameters`] is the immutable configuration shared by every key of
//! a [`FaultTolerantCache`](super::FaultTolerantCache). Its plain-data part,
//! [`RefreshSettings`], can be deserialized from TOML or JSON so the refresh
//! windows live in application config files; the failure observer is code
//! and is attached through [`CacheParametersBuilder`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{BoxedError, CacheError, CacheResult};

/// Default time after which an abandoned background refresh stops blocking
/// new refreshes of the same key
pub const DEFAULT_REFRESH_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of background refresh workers
pub const DEFAULT_REFRESH_WORKERS: usize = 10;

/// Observer invoked with the key and error whenever the source fails
pub type FailureObserver<K> = Arc<dyn Fn(&K, &BoxedError) + Send + Sync>;

/// Serde helper storing a [`Duration`] as whole milliseconds
mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

const fn default_refresh_lock_timeout() -> Duration {
    DEFAULT_REFRESH_LOCK_TIMEOUT
}

const fn default_refresh_workers() -> usize {
    DEFAULT_REFRESH_WORKERS
}

/// Declarative refresh configuration
///
/// Durations are expressed in milliseconds when serialized:
///
/// ```
/// use std::time::Duration;
///
/// use refreshahead_cache::cache::RefreshSettings;
///
/// let settings = RefreshSettings::from_toml_str(
///     r#"
///     freshness_window_ms = 300000
///     stale_window_ms = 1200000
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(settings.freshness_window, Duration::from_secs(300));
/// assert_eq!(settings.refresh_workers, 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSettings {
    /// Age below which an entry is served without any refresh
    #[serde(rename = "freshness_window_ms", with = "duration_millis")]
    pub freshness_window: Duration,

    /// Age below which a stale entry is served while refreshing in the
    /// background; older entries are refreshed synchronously
    #[serde(rename = "stale_window_ms", with = "duration_millis")]
    pub stale_window: Duration,

    /// How long a background refresh may hold its key before it is
    /// considered abandoned
    #[serde(
        rename = "refresh_lock_timeout_ms",
        with = "duration_millis",
        default = "default_refresh_lock_timeout"
    )]
    pub refresh_lock_timeout: Duration,

    /// Maximum number of background refreshes running at once
    #[serde(default = "default_refresh_workers")]
    pub refresh_workers: usize,
}

impl RefreshSettings {
    /// Settings with the given windows and default lock timeout and workers
    pub const fn new(freshness_window: Duration, stale_window: Duration) -> Self {
        Self {
            freshness_window,
            stale_window,
            refresh_lock_timeout: DEFAULT_REFRESH_LOCK_TIMEOUT,
            refresh_workers: DEFAULT_REFRESH_WORKERS,
        }
    }

    /// Parse settings from a TOML document and validate them
    pub fn from_toml_str(input: &str) -> CacheResult<Self> {
        let settings: Self = toml::from_str(input)
            .map_err(|e| CacheError::invalid_config("settings", e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    ///
    /// A freshness window longer than the stale window is accepted: the
    /// background refresh tier simply has zero width.
    pub fn validate(&self) -> CacheResult<()> {
        if self.refresh_workers == 0 {
            return Err(CacheError::invalid_config(
                "refresh_workers",
                "must be greater than 0",
            ));
        }
        if self.refresh_lock_timeout.is_zero() {
            return Err(CacheError::invalid_config(
                "refresh_lock_timeout",
                "must be greater than 0",
            ));
        }
        if self.freshness_window > self.stale_window {
            warn!(
                freshness_window = ?self.freshness_window,
                stale_window = ?self.stale_window,
                "freshness window exceeds stale window; background refresh is disabled"
            );
        }
        Ok(())
    }
}

/// Immutable configuration for a [`FaultTolerantCache`](super::FaultTolerantCache)
///
/// # Example
/// ```
/// use std::time::Duration;
///
/// use refreshahead_cache::cache::CacheParameters;
///
/// let params: CacheParameters<String> = CacheParameters::builder()
///     .freshness_window(Duration::from_secs(5 * 60))
///     .stale_window(Duration::from_secs(20 * 60))
///     .on_fetch_failure(|key, err| eprintln!("refresh of {key} failed: {err}"))
///     .build()
///     .unwrap();
///
/// assert_eq!(params.stale_window(), Duration::from_secs(1200));
/// ```
pub struct CacheParameters<K> {
    settings: RefreshSettings,
    on_fetch_failure: Option<FailureObserver<K>>,
}

impl<K> CacheParameters<K> {
    /// Parameters with the given windows, no observer and default workers
    pub const fn new(freshness_window: Duration, stale_window: Duration) -> Self {
        Self { settings: RefreshSettings::new(freshness_window, stale_window), on_fetch_failure: None }
    }

    /// Build parameters from validated settings
    pub fn from_settings(settings: RefreshSettings) -> CacheResult<Self> {
        settings.validate()?;
        Ok(Self { settings, on_fetch_failure: None })
    }

    /// Create a new parameters builder
    pub fn builder() -> CacheParametersBuilder<K> {
        CacheParametersBuilder::new()
    }

    /// Age below which an entry is served without any refresh
    pub const fn freshness_window(&self) -> Duration {
        self.settings.freshness_window
    }

    /// Age below which a stale entry triggers a background refresh only
    pub const fn stale_window(&self) -> Duration {
        self.settings.stale_window
    }

    /// Lock timeout of the single-fetch tracker
    pub const fn refresh_lock_timeout(&self) -> Duration {
        self.settings.refresh_lock_timeout
    }

    /// Number of background refresh workers
    pub const fn refresh_workers(&self) -> usize {
        self.settings.refresh_workers
    }

    /// The plain-data part of the parameters
    pub const fn settings(&self) -> &RefreshSettings {
        &self.settings
    }

    /// The failure observer, if one was configured
    pub fn on_fetch_failure(&self) -> Option<&FailureObserver<K>> {
        self.on_fetch_failure.as_ref()
    }

    pub(crate) fn notify_failure(&self, key: &K, error: &BoxedError) {
        if let Some(observer) = &self.on_fetch_failure {
            observer(key, error);
        }
    }
}

impl<K> Clone for CacheParameters<K> {
    fn clone(&self) -> Self {
        Self { settings: self.settings, on_fetch_failure: self.on_fetch_failure.clone() }
    }
}

impl<K> fmt::Debug for CacheParameters<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheParameters")
            .field("settings", &self.settings)
            .field("on_fetch_failure", &self.on_fetch_failure.is_some())
            .finish()
    }
}

/// Builder for [`CacheParameters`] with fluent API
///
/// Both windows are required; lock timeout and worker count fall back to
/// [`DEFAULT_REFRESH_LOCK_TIMEOUT`] and [`DEFAULT_REFRESH_WORKERS`].
pub struct CacheParametersBuilder<K> {
    freshness_window: Option<Duration>,
    stale_window: Option<Duration>,
    refresh_lock_timeout: Duration,
    refresh_workers: usize,
    on_fetch_failure: Option<FailureObserver<K>>,
}

impl<K> Default for CacheParametersBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for CacheParametersBuilder<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheParametersBuilder")
            .field("freshness_window", &self.freshness_window)
            .field("stale_window", &self.stale_window)
            .field("refresh_lock_timeout", &self.refresh_lock_timeout)
            .field("refresh_workers", &self.refresh_workers)
            .field("on_fetch_failure", &self.on_fetch_failure.is_some())
            .finish()
    }
}

impl<K> CacheParametersBuilder<K> {
    /// Create a new builder with default settings
    pub const fn new() -> Self {
        Self {
            freshness_window: None,
            stale_window: None,
            refresh_lock_timeout: DEFAULT_REFRESH_LOCK_TIMEOUT,
            refresh_workers: DEFAULT_REFRESH_WORKERS,
            on_fetch_failure: None,
        }
    }

    /// Start from existing settings
    pub fn settings(mut self, settings: RefreshSettings) -> Self {
        self.freshness_window = Some(settings.freshness_window);
        self.stale_window = Some(settings.stale_window);
        self.refresh_lock_timeout = settings.refresh_lock_timeout;
        self.refresh_workers = settings.refresh_workers;
        self
    }

    /// Set the freshness window
    pub fn freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = Some(window);
        self
    }

    /// Set the stale window
    pub fn stale_window(mut self, window: Duration) -> Self {
        self.stale_window = Some(window);
        self
    }

    /// Set the single-fetch lock timeout
    pub fn refresh_lock_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_lock_timeout = timeout;
        self
    }

    /// Set the number of background refresh workers
    pub fn refresh_workers(mut self, workers: usize) -> Self {
        self.refresh_workers = workers;
        self
    }

    /// Set the observer notified on every source failure
    pub fn on_fetch_failure<F>(mut self, observer: F) -> Self
    where
        F: Fn(&K, &BoxedError) + Send + Sync + 'static,
    {
        self.on_fetch_failure = Some(Arc::new(observer));
        self
    }

    /// Build the parameters
    pub fn build(self) -> CacheResult<CacheParameters<K>> {
        let freshness_window = self
            .freshness_window
            .ok_or_else(|| CacheError::invalid_config("freshness_window", "must be set"))?;
        let stale_window = self
            .stale_window
            .ok_or_else(|| CacheError::invalid_config("stale_window", "must be set"))?;

        let settings = RefreshSettings {
            freshness_window,
            stale_window,
            refresh_lock_timeout: self.refresh_lock_timeout,
            refresh_workers: self.refresh_workers,
        };
        settings.validate()?;

        Ok(CacheParameters { settings, on_fetch_failure: self.on_fetch_failure })
    }
}
