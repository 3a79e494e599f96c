//! Error types for PQ Sync
//!
//! Remote synchronization failures are kept apart from local validation
//! failures: the desk surfaces [`CoreError`] to callers immediately, while
//! [`SyncError`] from background pushes is only ever logged.

use crate::tabular::StoreError;
use pq_core::CoreError;

/// Synchronization failures
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No remote store configured
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),

    /// Remote call failed
    #[error("remote store error: {0}")]
    Store(#[from] StoreError),
}

impl SyncError {
    /// Create the not-configured error
    #[inline]
    pub fn not_configured() -> Self {
        Self::RemoteUnavailable("remote store is not configured".to_string())
    }

    /// Check if the remote could not be reached or is not configured
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::RemoteUnavailable(_) => true,
            Self::Store(e) => e.is_unavailable(),
        }
    }

    /// Check if the next push could succeed without intervention
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_retryable())
    }
}

/// Errors returned by desk operations
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// Validation or lookup failure
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Explicit sync or reload failure
    #[error(transparent)]
    Sync(#[from] SyncError),
}

impl DeskError {
    /// The core error, if this is one
    #[inline]
    #[must_use]
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Sync(_) => None,
        }
    }
}
