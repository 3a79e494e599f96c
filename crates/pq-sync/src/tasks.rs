//! Detached background work
//!
//! Pushes and notifications run after the mutation that triggered them has
//! returned. Failures are logged under the task name and dropped: transient
//! ones at `warn`, since the next change retries them, and the rest at
//! `error`. `flush` lets a short-lived process wait for everything it queued.

use crate::error::SyncError;
use crate::notify::NotifyError;
use parking_lot::Mutex;
use std::fmt::Display;
use std::future::Future;
use tokio::task::JoinHandle;

/// Failure of a background task
pub trait TaskError: Display + Send + 'static {
    /// Whether a later attempt could succeed without intervention
    fn is_retryable(&self) -> bool;
}

impl TaskError for SyncError {
    fn is_retryable(&self) -> bool {
        SyncError::is_retryable(self)
    }
}

impl TaskError for NotifyError {
    fn is_retryable(&self) -> bool {
        NotifyError::is_retryable(self)
    }
}

/// Set of spawned, not-yet-awaited tasks
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    /// Empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` on the current runtime; an `Err` is logged and dropped
    pub fn spawn<F, E>(&self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: TaskError,
    {
        let handle = tokio::spawn(async move {
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_retryable() => {
                    tracing::warn!(task = name, error = %e, "background task failed, will retry");
                }
                Err(e) => tracing::error!(task = name, error = %e, "background task failed"),
            }
        });

        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Tasks not yet known to be finished
    #[must_use]
    pub fn pending(&self) -> usize {
        self.handles.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every spawned task, including ones spawned while waiting
    pub async fn flush(&self) {
        loop {
            let handles = std::mem::take(&mut *self.handles.lock());
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "background task panicked");
                }
            }
        }
    }
}
