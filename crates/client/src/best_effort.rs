//! Detached work whose outcome nobody waits for.
//!
//! A task handed to [`BestEffort::spawn`] runs on its own; its error is
//! logged at debug level and dropped. The only thing recorded is that the
//! task was started.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rostercache_core::Error;
use tokio::task::JoinHandle;

/// Spawner for fire-and-forget tasks with an attempt counter.
#[derive(Debug, Clone, Default)]
pub struct BestEffort {
    label: &'static str,
    attempts: Arc<AtomicU64>,
}

impl BestEffort {
    pub fn new(label: &'static str) -> Self {
        Self { label, attempts: Arc::new(AtomicU64::new(0)) }
    }

    /// Start `task` in the background. Its result is discarded.
    ///
    /// The returned handle may be dropped; the task keeps running.
    pub fn spawn<F>(&self, url: &str, task: F) -> JoinHandle<()>
    where
        F: Future<Output = Result<(), Error>> + Send + 'static,
    {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let label = self.label;
        let url = url.to_string();
        tokio::spawn(async move {
            match task.await {
                Ok(()) => tracing::trace!(task = label, %url, "best-effort task finished"),
                Err(e) => tracing::debug!(task = label, %url, error = %e, "best-effort task failed; ignored"),
            }
        })
    }

    /// Number of tasks started so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}
