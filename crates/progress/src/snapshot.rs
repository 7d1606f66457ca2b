//! Point-in-time copies of a progress record

use crate::record::RecordState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use upstate_types::{FieldStates, Outcome, TransferId, UploadStatus, UploadedFile};

/// Every field of a record, copied under one lock acquisition, plus the
/// figures derived from them at capture time.
///
/// This is the form a record takes when it crosses a serialization
/// boundary, and what pollers hand to their callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    pub transfer_id: Option<TransferId>,
    pub status: UploadStatus,
    pub start_time: DateTime<Utc>,
    pub stop_time: Option<DateTime<Utc>>,
    pub file_bytes_read: u64,
    pub sync_bytes_read: u64,
    pub async_bytes_read: u64,
    pub sync_bytes_total: u64,
    pub async_bytes_total: u64,
    pub content_length: u64,
    pub current_file_name: String,
    #[serde(default)]
    pub field_states: FieldStates,
    #[serde(default)]
    pub files: Vec<(String, UploadedFile)>,
    #[serde(default)]
    pub file_sizes: Vec<u64>,
    pub async_files_received: u32,
    pub is_async: bool,
    pub outcome: Option<Outcome>,
    pub bytes_read: u64,
    pub bytes_total: u64,
    pub fraction_complete: f64,
    pub time_elapsed: Duration,
    pub time_remaining: Option<Duration>,
    pub bytes_per_sec: u64,
}

impl RecordSnapshot {
    pub(crate) fn capture(state: &mut RecordState, now: DateTime<Utc>) -> Self {
        let bytes_per_sec = state.bytes_per_sec(now);
        let (
            file_bytes_read,
            sync_bytes_read,
            async_bytes_read,
            sync_bytes_total,
            async_bytes_total,
            content_length,
        ) = state.counters();
        Self {
            transfer_id: state.transfer_id().cloned(),
            status: state.status(),
            start_time: state.start_time(),
            stop_time: state.stop_time(),
            file_bytes_read,
            sync_bytes_read,
            async_bytes_read,
            sync_bytes_total,
            async_bytes_total,
            content_length,
            current_file_name: state.current_file_name().to_string(),
            field_states: state.field_states().clone(),
            files: state.files().to_vec(),
            file_sizes: state.file_sizes().to_vec(),
            async_files_received: state.async_files_received(),
            is_async: state.is_async(),
            outcome: state.outcome().cloned(),
            bytes_read: state.bytes_read(),
            bytes_total: state.bytes_total(),
            fraction_complete: state.fraction_complete(),
            time_elapsed: state.time_elapsed(now),
            time_remaining: state.time_remaining(now),
            bytes_per_sec,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
