//! Record store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Failures reported by a session-scoped backing store.
///
/// None of these reach a poller. The coordinator treats them as the
/// session tier being unavailable and falls back to the process tier.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("session unavailable: {reason}")]
    SessionUnavailable { reason: String },

    #[error("session is read-only")]
    ReadOnly,

    #[error("lock acquisition failed: {key}")]
    LockFailed { key: String },
}

impl UserFacingError for StoreError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::SessionUnavailable { .. } | Self::ReadOnly => {
                Some("Progress is still published process-wide; pollers can look it up by id.")
            }
            Self::LockFailed { .. } => Some("Retry once the other request releases the session."),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::LockFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::SessionUnavailable { .. } => "store.session_unavailable",
            Self::ReadOnly => "store.read_only",
            Self::LockFailed { .. } => "store.lock_failed",
        };
        Some(code)
    }
}
