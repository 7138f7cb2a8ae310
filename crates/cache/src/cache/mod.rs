//! Refresh-ahead, fault-tolerant key-value cache
//!
//! A read-through cache that keeps serving previously fetched values while
//! refreshing them ahead of expiry, and that serves stale data instead of
//! failing when the source is unavailable.
//!
//! # Features
//!
//! - **Two-window freshness**: entries younger than the freshness window are
//!   served directly; entries inside the stale window are served while a
//!   background refresh runs; older entries are refreshed synchronously
//! - **Single-flight refresh**: at most one background refresh per key,
//!   guarded by a lock with a timeout
//! - **Fault tolerance**: once a key has a value, source failures are
//!   reported to an observer and the cached value is served
//! - **Bounded workers**: background refreshes share a fixed-size pool
//! - **Testable**: clock abstraction for deterministic time-based testing
//!
//! # Examples
//!
//! ## Read-through lookups
//! ```
//! use std::time::Duration;
//!
//! use refreshahead_cache::cache::{source_fn, CacheParameters, FaultTolerantCache};
//!
//! let cache = FaultTolerantCache::new(
//!     source_fn(|id: &u32| Ok(Some(format!("user-{id}")))),
//!     CacheParameters::new(Duration::from_secs(60), Duration::from_secs(600)),
//! )
//! .unwrap();
//!
//! assert_eq!(cache.get(&7).unwrap().as_deref(), Some("user-7"));
//! ```
//!
//! ## Observing failures
//! ```
//! use std::time::Duration;
//!
//! use refreshahead_cache::cache::CacheParameters;
//!
//! let params: CacheParameters<u32> = CacheParameters::builder()
//!     .freshness_window(Duration::from_secs(60))
//!     .stale_window(Duration::from_secs(600))
//!     .refresh_workers(4)
//!     .on_fetch_failure(|id, err| eprintln!("refresh of {id} failed: {err}"))
//!     .build()
//!     .unwrap();
//! # let _ = params;
//! ```

mod config;
mod core;
mod entry;
mod executor;
mod stats;
mod tracker;

pub use config::{
    CacheParameters, CacheParametersBuilder, FailureObserver, RefreshSettings,
    DEFAULT_REFRESH_LOCK_TIMEOUT, DEFAULT_REFRESH_WORKERS,
};
pub use self::core::{source_fn, FaultTolerantCache, KeyState, Source};
pub use entry::{CacheEntry, EntryState};
pub use stats::CacheStats;
pub use tracker::SingleFetchTracker;
