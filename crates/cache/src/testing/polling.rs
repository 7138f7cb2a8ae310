//! Polling helpers for asserting on background work

use std::future::Future;
use std::time::{Duration, Instant};

/// Interval between condition checks
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Block until `condition` holds or `timeout` elapses
///
/// Returns whether the condition was observed to hold.
///
/// ```
/// # #[cfg(feature = "test-utils")]
/// # {
/// use std::time::Duration;
///
/// use refreshahead_cache::testing::wait_until;
///
/// let mut polls = 0;
/// assert!(wait_until(Duration::from_secs(1), || {
///     polls += 1;
///     polls == 3
/// }));
/// # }
/// ```
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Async variant of [`wait_until`] that yields to the runtime between checks
pub async fn poll_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
