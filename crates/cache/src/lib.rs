//! Refresh-ahead, fault-tolerant key-value cache.
//!
//! The cache wraps a blocking [`Source`] lookup and answers reads from
//! memory whenever it can:
//!
//! - fresh entries are served as-is
//! - stale entries are served immediately while a single background refresh
//!   per key runs on a bounded worker pool
//! - entries past the stale window are refreshed on the caller's thread, and
//!   served anyway if the source fails
//!
//! Only a key that has never been cached can surface a source failure to the
//! caller. Every failure is reported to an optional observer.
//!
//! # Modules
//!
//! - [`cache`]: the cache, its parameters, entries and single-flight tracker
//! - [`clock`]: time abstraction with a mock for tests
//! - [`error`]: error types and classification
//! - `testing`: scripted sources and polling helpers (`test-utils` feature)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod cache;
pub mod clock;
pub mod error;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

pub use cache::{
    source_fn, CacheEntry, CacheParameters, CacheParametersBuilder, CacheStats, EntryState,
    FailureObserver, FaultTolerantCache, KeyState, RefreshSettings, SingleFetchTracker, Source,
};
pub use clock::{Clock, MockClock, SystemClock};
pub use error::{BoxedError, CacheError, CacheResult, ErrorClassification, ErrorSeverity};
