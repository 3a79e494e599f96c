//! Notification port
//!
//! Fire-and-forget delivery of the admin message for a new submission.
//! Failures are reported to the caller, which logs and drops them; they
//! never fail the submission.

use async_trait::async_trait;
use pq_core::QuoteNotification;

/// Notification delivery failures
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport has no credentials or recipient
    #[error("notifications disabled: {0}")]
    Disabled(String),

    /// Request did not reach the provider
    #[error("notification transport error: {0}")]
    Transport(String),

    /// Provider refused the message
    #[error("notification rejected ({status}): {message}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Provider message
        message: String,
    },
}

impl NotifyError {
    /// Check if a later attempt could succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Disabled(_) => false,
            Self::Transport(_) => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
        }
    }
}

/// Outbound notification transport
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationPort: Send + Sync {
    /// Deliver `message`
    ///
    /// # Errors
    /// - `NotifyError` if delivery fails
    async fn notify(&self, message: QuoteNotification) -> Result<(), NotifyError>;

    /// Whether this transport actually delivers anything
    fn is_enabled(&self) -> bool {
        true
    }
}

impl std::fmt::Debug for dyn NotificationPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationPort")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Transport used when no provider is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl NotificationPort for NoopNotifier {
    async fn notify(&self, message: QuoteNotification) -> Result<(), NotifyError> {
        tracing::debug!(
            request_id = %message.request.id,
            "notifications not configured, skipping"
        );
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses() {
        assert!(NotifyError::Transport("reset".to_string()).is_retryable());
        assert!(NotifyError::Rejected {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(!NotifyError::Rejected {
            status: 422,
            message: String::new()
        }
        .is_retryable());
        assert!(!NotifyError::Disabled("no key".to_string()).is_retryable());
    }

    #[tokio::test]
    async fn noop_is_disabled_and_succeeds() {
        let request = pq_core::NewRequest::new("a", "b@c.d", "https://x.test")
            .into_request()
            .unwrap();
        let message = QuoteNotification::compose(
            &request,
            pq_core::DetectedSource::unknown(),
            "http://localhost",
        );
        assert!(!NoopNotifier.is_enabled());
        assert!(NoopNotifier.notify(message).await.is_ok());
    }
}
