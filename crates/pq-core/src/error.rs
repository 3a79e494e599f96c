//! Error types for PQ Core
//!
//! Covers the failures a local mutation can surface synchronously:
//! - Missing required fields at submission
//! - Status values outside the workflow enumeration
//! - Unknown request ids
//! - Settings edits that sanitize to nothing

use crate::types::RequestId;

/// Main core error type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// A required submission field was empty after trimming
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Status value outside the fixed enumeration
    #[error("invalid status: {0:?}")]
    InvalidStatus(String),

    /// No request with this id
    #[error("request not found: {0}")]
    NotFound(RequestId),

    /// Settings edit rejected
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl CoreError {
    /// Check if the error came from caller input rather than missing state
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::InvalidStatus(_) | Self::InvalidSettings(_)
        )
    }
}

/// Result alias for core operations
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
