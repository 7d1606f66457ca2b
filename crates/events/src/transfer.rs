use serde::{Deserialize, Serialize};
use tracing::Level;
use upstate_errors::UserFacingError;
use upstate_types::{Tier, TransferId, UploadStatus};

use crate::EventSource;

/// Structured failure information attached to events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.user_code().map(Into::into),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(Into::into),
            retryable: error.is_retryable(),
        }
    }
}

/// Lifecycle notifications for one transfer.
///
/// Emitted after the record lock has been released, so a slow receiver never
/// holds up the request feeding the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    /// The receiving context registered a new record
    Started { transfer_id: TransferId, tier: Tier },

    /// Local progress was copied into a storage tier
    Published {
        transfer_id: TransferId,
        tier: Tier,
        bytes_read: u64,
        status: UploadStatus,
    },

    /// A terminal status found in the store replaced the local one
    StatusPulledDown {
        transfer_id: TransferId,
        status: UploadStatus,
    },

    /// A poller asked for the transfer to stop
    CancelRequested { transfer_id: TransferId },

    /// A finished record moved to the cache tier
    Demoted {
        transfer_id: TransferId,
        status: UploadStatus,
    },

    /// The session tier failed and the record fell back to the process tier
    SessionUnavailable {
        transfer_id: TransferId,
        failure: FailureContext,
    },
}

impl TransferEvent {
    #[must_use]
    pub fn transfer_id(&self) -> &TransferId {
        match self {
            Self::Started { transfer_id, .. }
            | Self::Published { transfer_id, .. }
            | Self::StatusPulledDown { transfer_id, .. }
            | Self::CancelRequested { transfer_id }
            | Self::Demoted { transfer_id, .. }
            | Self::SessionUnavailable { transfer_id, .. } => transfer_id,
        }
    }

    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::Started { .. } | Self::CancelRequested { .. } => EventSource::TRANSFER,
            Self::Published { .. } | Self::StatusPulledDown { .. } => EventSource::SYNC,
            Self::Demoted { .. } | Self::SessionUnavailable { .. } => EventSource::STORE,
        }
    }

    #[must_use]
    pub fn log_level(&self) -> Level {
        match self {
            Self::SessionUnavailable { .. } => Level::WARN,
            Self::Published { .. } => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}
