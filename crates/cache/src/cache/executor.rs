//! Bounded worker pool for background refreshes
//!
//! Refresh tasks call the source, which is expected to block on I/O, so they
//! run on tokio's blocking pool. A semaphore caps how many run at once;
//! tasks beyond the cap wait in the runtime's queue until a permit frees up.
//!
//! The pool either owns a small dedicated runtime or borrows the handle of
//! an embedding application's runtime.

use std::sync::Arc;

use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::CacheResult;

#[derive(Debug)]
pub(crate) struct RefreshExecutor {
    handle: Handle,
    // Only present when the executor owns its runtime.
    runtime: Option<Runtime>,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl RefreshExecutor {
    /// Start a dedicated runtime with at most `workers` refresh threads
    pub(crate) fn new(workers: usize) -> CacheResult<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("refresh-worker")
            .build()?;
        info!(workers, "started background refresh workers");

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(runtime),
            permits: Arc::new(Semaphore::new(workers)),
            max_workers: workers,
        })
    }

    /// Run refreshes on an existing runtime, at most `workers` at a time
    pub(crate) fn with_handle(handle: Handle, workers: usize) -> Self {
        debug!(workers, "using embedding runtime for background refreshes");
        Self { handle, runtime: None, permits: Arc::new(Semaphore::new(workers)), max_workers: workers }
    }

    /// Queue a blocking task; returns immediately
    pub(crate) fn submit<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.handle.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if let Err(e) = tokio::task::spawn_blocking(task).await {
                warn!(error = %e, "background refresh task did not complete");
            }
        });
    }

    /// Number of refresh tasks currently holding a worker
    pub(crate) fn active(&self) -> usize {
        self.max_workers.saturating_sub(self.permits.available_permits())
    }

    pub(crate) const fn max_workers(&self) -> usize {
        self.max_workers
    }
}

impl Drop for RefreshExecutor {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            // In-flight refreshes are detached rather than awaited.
            runtime.shutdown_background();
        }
    }
}
