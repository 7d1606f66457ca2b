//! Upload status

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a transfer attempt.
///
/// `InProgress` and `ChunkedInProgress` are the only non-terminal values.
/// Every other value is terminal and one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    #[default]
    InProgress,
    ChunkedInProgress,
    Completed,
    Failed,
    Rejected,
    Cancelled,
}

impl UploadStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !self.is_in_progress()
    }

    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress | Self::ChunkedInProgress)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::ChunkedInProgress => "chunked_in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
