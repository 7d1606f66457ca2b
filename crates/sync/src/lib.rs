#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Cross-context synchronisation of upload progress
//!
//! The context receiving an upload owns a local [`ProgressRecord`]. The
//! [`SyncCoordinator`] publishes it into the record store, where pollers
//! look it up by transfer id, and pulls terminal decisions made elsewhere
//! (a cancellation, say) back into the local record.
//!
//! [`ProgressRecord`]: upstate_progress::ProgressRecord

mod coordinator;
mod lifecycle;
mod periodic;

pub use coordinator::SyncCoordinator;
pub use periodic::spawn_periodic_sync;

use std::time::Duration;
use upstate_progress::DEFAULT_RATE_WINDOW;

/// Default interval between periodic publishes
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(500);

/// Timing options for a [`SyncCoordinator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub sync_interval: Duration,
    /// Rate sample window for records the coordinator creates
    pub rate_window: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            sync_interval: DEFAULT_SYNC_INTERVAL,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }
}
