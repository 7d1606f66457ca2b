//! The mutable progress record of one transfer attempt
//!
//! Every read and write goes through a single record-wide mutex, including
//! compound reads such as [`ProgressRecord::bytes_read`] and
//! [`ProgressRecord::time_elapsed`]. The lock is never held across I/O.

use crate::clock::{span, Clock, SystemClock};
use crate::rate::{RateEstimator, RateInput};
use crate::snapshot::RecordSnapshot;
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;
use upstate_types::{FieldStates, Outcome, TransferId, UploadStatus, UploadedFile};

/// Record shared between the contexts that can reach it
pub type SharedRecord = Arc<ProgressRecord>;

/// Lock-protected progress of one transfer attempt
#[derive(Debug)]
pub struct ProgressRecord {
    state: Mutex<RecordState>,
    clock: Arc<dyn Clock>,
}

/// Fields guarded by the record lock.
///
/// Obtained through [`ProgressRecord::lock`]. The sync coordinator holds two
/// of these at once while it copies state between records.
#[derive(Debug, Clone)]
pub struct RecordState {
    transfer_id: Option<TransferId>,
    status: UploadStatus,
    start_time: DateTime<Utc>,
    /// `None` while the transfer is open
    stop_time: Option<DateTime<Utc>>,
    file_bytes_read: u64,
    sync_bytes_read: u64,
    async_bytes_read: u64,
    sync_bytes_total: u64,
    async_bytes_total: u64,
    content_length: u64,
    current_file_name: String,
    field_states: FieldStates,
    files: Vec<(String, UploadedFile)>,
    file_sizes: Vec<u64>,
    async_files_received: u32,
    is_async: bool,
    outcome: Option<Outcome>,
    rate: RateEstimator,
    dirty: bool,
    never_synced: bool,
    session_available: bool,
    /// Set once a store has moved this record into its cache tier
    demoted: bool,
}

impl RecordState {
    fn new(transfer_id: Option<TransferId>, now: DateTime<Utc>) -> Self {
        Self {
            transfer_id,
            status: UploadStatus::InProgress,
            start_time: now,
            stop_time: None,
            file_bytes_read: 0,
            sync_bytes_read: 0,
            async_bytes_read: 0,
            sync_bytes_total: 0,
            async_bytes_total: 0,
            content_length: 0,
            current_file_name: String::new(),
            field_states: FieldStates::new(),
            files: Vec::new(),
            file_sizes: Vec::new(),
            async_files_received: 0,
            is_async: false,
            outcome: None,
            rate: RateEstimator::default(),
            dirty: false,
            never_synced: true,
            session_available: true,
            demoted: false,
        }
    }

    #[must_use]
    pub fn transfer_id(&self) -> Option<&TransferId> {
        self.transfer_id.as_ref()
    }

    #[must_use]
    pub fn status(&self) -> UploadStatus {
        self.status
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    #[must_use]
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.stop_time
    }

    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.sync_bytes_read + self.async_bytes_read
    }

    #[must_use]
    pub fn bytes_total(&self) -> u64 {
        self.sync_bytes_total + self.async_bytes_total
    }

    /// Share of the expected bytes received, 0 when the total is unknown
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction_complete(&self) -> f64 {
        let total = self.bytes_total();
        if total == 0 {
            return 0.0;
        }
        (self.bytes_read() as f64 / total as f64).min(1.0)
    }

    #[must_use]
    pub fn time_elapsed(&self, now: DateTime<Utc>) -> Duration {
        span(self.start_time, self.stop_time.unwrap_or(now))
    }

    /// Projected time to completion; `None` means unbounded
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        let read = self.bytes_read();
        let total = self.bytes_total();
        if read == 0 || total == 0 {
            return None;
        }
        let remaining = total.saturating_sub(read) as f64;
        let elapsed = self.time_elapsed(now).as_secs_f64();
        Duration::try_from_secs_f64(remaining * elapsed / read as f64).ok()
    }

    /// Current rate estimate; advances the estimator's sample point
    pub fn bytes_per_sec(&mut self, now: DateTime<Utc>) -> u64 {
        let input = RateInput {
            bytes_read: self.bytes_read(),
            start_time: self.start_time,
            time_elapsed: self.time_elapsed(now),
            terminal: self.status.is_terminal(),
            now,
        };
        self.rate.sample(input)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    #[must_use]
    pub fn current_file_name(&self) -> &str {
        &self.current_file_name
    }

    #[must_use]
    pub fn files(&self) -> &[(String, UploadedFile)] {
        &self.files
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    #[must_use]
    pub fn field_states(&self) -> &FieldStates {
        &self.field_states
    }

    #[must_use]
    pub fn file_sizes(&self) -> &[u64] {
        &self.file_sizes
    }

    #[must_use]
    pub fn async_files_received(&self) -> u32 {
        self.async_files_received
    }

    /// Raw counters: file bytes, sync read, async read, sync total, async
    /// total, content length
    #[must_use]
    pub(crate) fn counters(&self) -> (u64, u64, u64, u64, u64, u64) {
        (
            self.file_bytes_read,
            self.sync_bytes_read,
            self.async_bytes_read,
            self.sync_bytes_total,
            self.async_bytes_total,
            self.content_length,
        )
    }

    /// Whether a session tier may still be tried for this record
    #[must_use]
    pub fn session_available(&self) -> bool {
        self.session_available
    }

    /// Whether this record has never been published
    #[must_use]
    pub fn never_synced(&self) -> bool {
        self.never_synced
    }

    /// Record that the session tier cannot be used for the rest of the attempt
    pub fn mark_session_unavailable(&mut self) {
        self.session_available = false;
    }

    pub fn mark_synced(&mut self) {
        self.never_synced = false;
    }

    /// Whether a store has already moved this record into its cache tier.
    ///
    /// A demoted record must not be registered in any other tier again.
    #[must_use]
    pub fn is_demoted(&self) -> bool {
        self.demoted
    }

    pub fn mark_demoted(&mut self) {
        self.demoted = true;
    }

    /// Return and clear the change flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Assign the transfer id if none has been assigned yet
    pub fn assign_transfer_id(&mut self, id: TransferId) -> bool {
        if self.transfer_id.is_some() {
            return false;
        }
        self.transfer_id = Some(id);
        self.dirty = true;
        true
    }

    /// Take a terminal status decided elsewhere, bypassing the one-way rule.
    ///
    /// Used when the store already holds a terminal status that must win over
    /// whatever this record believes.
    pub fn adopt_status(&mut self, status: UploadStatus, stop_time: Option<DateTime<Utc>>) {
        self.status = status;
        self.stop_time = if status.is_terminal() {
            stop_time.map(|t| t.max(self.start_time))
        } else {
            None
        };
    }

    /// Copy the publishable fields of `source` into this record.
    ///
    /// Rate sampling state and sync bookkeeping stay with each record.
    pub fn copy_progress_from(&mut self, source: &RecordState) {
        if self.transfer_id.is_none() {
            self.transfer_id.clone_from(&source.transfer_id);
        }
        self.file_bytes_read = source.file_bytes_read;
        self.sync_bytes_read = source.sync_bytes_read;
        self.async_bytes_read = source.async_bytes_read;
        self.sync_bytes_total = source.sync_bytes_total;
        self.async_bytes_total = source.async_bytes_total;
        self.content_length = source.content_length;
        self.status = source.status;
        self.outcome.clone_from(&source.outcome);
        self.start_time = source.start_time;
        self.stop_time = source.stop_time;
        self.current_file_name.clone_from(&source.current_file_name);
        self.field_states.clone_from(&source.field_states);
        self.files.clone_from(&source.files);
        self.file_sizes.clone_from(&source.file_sizes);
        self.async_files_received = source.async_files_received;
        self.is_async = source.is_async;
    }

    /// Overwrite every field from `source`, including the rate state
    pub fn copy_all_from(&mut self, source: &RecordState) {
        self.transfer_id.clone_from(&source.transfer_id);
        self.copy_progress_from(source);
        self.rate.clone_from(&source.rate);
    }

    fn set_status(&mut self, status: UploadStatus, now: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if status.is_terminal() {
            self.stop_time = Some(now.max(self.start_time));
            trace!(transfer_id = ?self.transfer_id, %status, "transfer reached terminal status");
        }
        if self.status != status {
            self.status = status;
            self.dirty = true;
        }
        true
    }

    fn set_outcome(&mut self, outcome: Outcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.outcome = Some(outcome);
        self.dirty = true;
        true
    }

    /// Run `f` against the counters unless the record is frozen
    fn update_open(&mut self, f: impl FnOnce(&mut Self)) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        f(self);
        self.dirty = true;
        true
    }
}

impl ProgressRecord {
    /// Start a new transfer attempt, open and in progress
    #[must_use]
    pub fn new(transfer_id: Option<TransferId>, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            state: Mutex::new(RecordState::new(transfer_id, now)),
            clock,
        }
    }

    /// Start a new transfer attempt timed by the system clock
    #[must_use]
    pub fn with_system_clock(transfer_id: Option<TransferId>) -> Self {
        Self::new(transfer_id, Arc::new(SystemClock))
    }

    /// Use a rate sampling window other than the default
    #[must_use]
    pub fn with_rate_window(mut self, window: Duration) -> Self {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .rate = RateEstimator::new(window);
        self
    }

    /// Rebuild a record on this side of a serialization boundary
    #[must_use]
    pub fn from_snapshot(snapshot: RecordSnapshot, clock: Arc<dyn Clock>) -> Self {
        let mut state = RecordState::new(snapshot.transfer_id, snapshot.start_time);
        state.status = snapshot.status;
        state.stop_time = snapshot.stop_time;
        state.file_bytes_read = snapshot.file_bytes_read;
        state.sync_bytes_read = snapshot.sync_bytes_read;
        state.async_bytes_read = snapshot.async_bytes_read;
        state.sync_bytes_total = snapshot.sync_bytes_total;
        state.async_bytes_total = snapshot.async_bytes_total;
        state.content_length = snapshot.content_length;
        state.current_file_name = snapshot.current_file_name;
        state.field_states = snapshot.field_states;
        state.files = snapshot.files;
        state.file_sizes = snapshot.file_sizes;
        state.async_files_received = snapshot.async_files_received;
        state.is_async = snapshot.is_async;
        state.outcome = snapshot.outcome;
        Self {
            state: Mutex::new(state),
            clock,
        }
    }

    /// Acquire the record lock
    pub fn lock(&self) -> MutexGuard<'_, RecordState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    #[must_use]
    pub fn transfer_id(&self) -> Option<TransferId> {
        self.lock().transfer_id.clone()
    }

    pub fn assign_transfer_id(&self, id: TransferId) -> bool {
        self.lock().assign_transfer_id(id)
    }

    #[must_use]
    pub fn status(&self) -> UploadStatus {
        self.lock().status
    }

    /// Change the status.
    ///
    /// A terminal status stamps the stop time under the same lock. Once the
    /// record is terminal every later call is ignored and `false` returned.
    pub fn set_status(&self, status: UploadStatus) -> bool {
        let now = self.clock.now();
        self.lock().set_status(status, now)
    }

    /// Request cancellation; safe from any context and idempotent
    pub fn cancel(&self) -> bool {
        self.set_status(UploadStatus::Cancelled)
    }

    #[must_use]
    pub fn start_time(&self) -> DateTime<Utc> {
        self.lock().start_time
    }

    #[must_use]
    pub fn stop_time(&self) -> Option<DateTime<Utc>> {
        self.lock().stop_time
    }

    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.lock().bytes_read()
    }

    #[must_use]
    pub fn sync_bytes_read(&self) -> u64 {
        self.lock().sync_bytes_read
    }

    #[must_use]
    pub fn async_bytes_read(&self) -> u64 {
        self.lock().async_bytes_read
    }

    #[must_use]
    pub fn file_bytes_read(&self) -> u64 {
        self.lock().file_bytes_read
    }

    #[must_use]
    pub fn bytes_total(&self) -> u64 {
        self.lock().bytes_total()
    }

    /// Count bytes received in the request being processed
    pub fn add_bytes_read(&self, n: u64) -> bool {
        self.lock()
            .update_open(|s| s.sync_bytes_read = s.sync_bytes_read.saturating_add(n))
    }

    /// Count bytes received by the separate requests of an async upload
    pub fn add_async_bytes_read(&self, n: u64) -> bool {
        self.lock()
            .update_open(|s| s.async_bytes_read = s.async_bytes_read.saturating_add(n))
    }

    /// Count bytes that belonged to file fields
    pub fn add_file_bytes_read(&self, n: u64) -> bool {
        self.lock()
            .update_open(|s| s.file_bytes_read = s.file_bytes_read.saturating_add(n))
    }

    /// Set the expected totals.
    ///
    /// A positive total is never lowered, so a revision that would shrink it
    /// is ignored.
    pub fn set_totals(&self, sync_total: u64, async_total: u64) -> bool {
        let mut state = self.lock();
        let current = state.bytes_total();
        if current > 0 && sync_total.saturating_add(async_total) < current {
            return false;
        }
        state.update_open(|s| {
            s.sync_bytes_total = sync_total;
            s.async_bytes_total = async_total;
        })
    }

    #[must_use]
    pub fn content_length(&self) -> u64 {
        self.lock().content_length
    }

    pub fn set_content_length(&self, length: u64) -> bool {
        self.lock().update_open(|s| s.content_length = length)
    }

    #[must_use]
    pub fn fraction_complete(&self) -> f64 {
        self.lock().fraction_complete()
    }

    #[must_use]
    pub fn time_elapsed(&self) -> Duration {
        let now = self.clock.now();
        self.lock().time_elapsed(now)
    }

    #[must_use]
    pub fn time_remaining(&self) -> Option<Duration> {
        let now = self.clock.now();
        self.lock().time_remaining(now)
    }

    pub fn bytes_per_sec(&self) -> u64 {
        let now = self.clock.now();
        self.lock().bytes_per_sec(now)
    }

    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.lock().outcome.clone()
    }

    /// Record why the transfer is going to stop
    pub fn set_outcome(&self, outcome: Outcome) -> bool {
        self.lock().set_outcome(outcome)
    }

    /// Classify and record an error raised by a collaborator
    pub fn set_outcome_from_error(
        &self,
        err: &(dyn StdError + 'static),
        component: Option<&str>,
    ) -> bool {
        self.set_outcome(Outcome::from_error(err, component))
    }

    /// Record the outcome and move to its terminal status in one step
    pub fn fail(&self, outcome: Outcome) -> bool {
        let now = self.clock.now();
        let mut state = self.lock();
        let status = outcome.terminal_status();
        state.set_outcome(outcome) && state.set_status(status, now)
    }

    #[must_use]
    pub fn current_file_name(&self) -> String {
        self.lock().current_file_name.clone()
    }

    pub fn set_current_file(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.lock().update_open(|s| s.current_file_name = name)
    }

    /// Append a received file; a non-empty name becomes the current file
    pub fn add_file(&self, field_id: impl Into<String>, file: UploadedFile) -> bool {
        let field_id = field_id.into();
        self.lock().update_open(|s| {
            if !file.file_name.is_empty() {
                s.current_file_name.clone_from(&file.file_name);
            }
            s.files.push((field_id, file));
        })
    }

    #[must_use]
    pub fn files(&self) -> Vec<(String, UploadedFile)> {
        self.lock().files.clone()
    }

    #[must_use]
    pub fn field_state(&self, field_id: &str) -> Option<serde_json::Value> {
        self.lock().field_states.get(field_id).cloned()
    }

    pub fn set_field_state(&self, field_id: impl Into<String>, value: serde_json::Value) -> bool {
        let field_id = field_id.into();
        self.lock().update_open(|s| {
            s.field_states.insert(field_id, value);
        })
    }

    #[must_use]
    pub fn file_sizes(&self) -> Vec<u64> {
        self.lock().file_sizes.clone()
    }

    pub fn set_file_sizes(&self, sizes: Vec<u64>) -> bool {
        self.lock().update_open(|s| s.file_sizes = sizes)
    }

    #[must_use]
    pub fn async_files_received(&self) -> u32 {
        self.lock().async_files_received
    }

    /// Count one finished request of an async upload.
    ///
    /// This is bookkeeping and still applies once the record is terminal.
    pub fn increment_async_files_received(&self) -> u32 {
        let mut state = self.lock();
        state.async_files_received = state.async_files_received.saturating_add(1);
        state.dirty = true;
        state.async_files_received
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.lock().is_async
    }

    pub fn set_async(&self, is_async: bool) {
        let mut state = self.lock();
        state.is_async = is_async;
        state.dirty = true;
    }

    #[must_use]
    pub fn session_available(&self) -> bool {
        self.lock().session_available
    }

    /// Return and clear the change flag
    pub fn take_dirty(&self) -> bool {
        self.lock().take_dirty()
    }

    /// Consistent copy of every field plus the derived figures
    pub fn snapshot(&self) -> RecordSnapshot {
        let now = self.clock.now();
        let mut state = self.lock();
        RecordSnapshot::capture(&mut state, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use upstate_errors::UploadRejection;

    fn record_with_clock() -> (ProgressRecord, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_now());
        let record = ProgressRecord::new(TransferId::parse("abc"), clock.clone());
        (record, clock)
    }

    #[test]
    fn new_record_is_open_and_in_progress() {
        let (record, _) = record_with_clock();
        assert_eq!(record.status(), UploadStatus::InProgress);
        assert!(record.stop_time().is_none());
        assert_eq!(record.current_file_name(), "");
        assert!(record.outcome().is_none());
    }

    #[test]
    fn terminal_status_stamps_stop_time_and_freezes() {
        let (record, clock) = record_with_clock();
        record.add_bytes_read(10);
        clock.advance_millis(2000);
        assert!(record.set_status(UploadStatus::Completed));
        let stopped = record.stop_time().expect("stop time stamped");
        assert_eq!(span(record.start_time(), stopped), Duration::from_secs(2));

        clock.advance_millis(5000);
        assert!(!record.set_status(UploadStatus::InProgress));
        assert!(!record.add_bytes_read(5));
        assert!(!record.cancel());
        assert_eq!(record.status(), UploadStatus::Completed);
        assert_eq!(record.bytes_read(), 10);
        assert_eq!(record.time_elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn fraction_and_remaining_time() {
        let (record, clock) = record_with_clock();
        assert!(record.time_remaining().is_none());
        assert!(record.fraction_complete().abs() < f64::EPSILON);

        record.set_totals(800, 200);
        record.add_bytes_read(250);
        clock.advance_millis(10_000);
        assert!((record.fraction_complete() - 0.25).abs() < 1e-9);
        assert_eq!(record.time_remaining(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn totals_never_shrink_once_positive() {
        let (record, _) = record_with_clock();
        assert!(record.set_totals(0, 0));
        assert!(record.set_totals(100, 0));
        assert!(!record.set_totals(50, 0));
        assert!(record.set_totals(100, 400));
        assert_eq!(record.bytes_total(), 500);
    }

    #[test]
    fn fail_classifies_outcome() {
        let (record, _) = record_with_clock();
        assert!(record.fail(UploadRejection::too_large(100).into()));
        assert_eq!(record.status(), UploadStatus::Rejected);
        assert_eq!(record.outcome().and_then(|o| o.status_code()), Some(413));

        let (other, _) = record_with_clock();
        let io = std::io::Error::other("storage offline");
        other.set_outcome_from_error(&io, Some("storage"));
        assert_eq!(other.status(), UploadStatus::InProgress);
        let outcome = other.outcome().expect("outcome");
        assert!(!outcome.is_rejection());
        assert_eq!(outcome.message(), "storage offline");
    }

    #[test]
    fn add_file_tracks_current_file_name() {
        let (record, _) = record_with_clock();
        record.add_file("field1", UploadedFile::new("a.txt"));
        record.add_file("field2", UploadedFile::new(""));
        assert_eq!(record.current_file_name(), "a.txt");
        assert_eq!(record.files().len(), 2);
        assert_eq!(record.files()[1].0, "field2");
    }

    #[test]
    fn dirty_flag_follows_effective_changes() {
        let (record, _) = record_with_clock();
        assert!(!record.take_dirty());
        record.add_bytes_read(1);
        assert!(record.take_dirty());
        assert!(!record.take_dirty());
        record.set_status(UploadStatus::InProgress);
        assert!(!record.take_dirty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let (record, _) = record_with_clock();
        assert!(record.cancel());
        assert!(!record.cancel());
        assert_eq!(record.status(), UploadStatus::Cancelled);
    }

    #[test]
    fn concurrent_writers_and_readers_agree() {
        let record = Arc::new(ProgressRecord::with_system_clock(TransferId::parse("t")));
        let writers: Vec<_> = (0..4)
            .map(|_| {
                let record = Arc::clone(&record);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        record.add_bytes_read(1);
                    }
                })
            })
            .collect();
        let reader = {
            let record = Arc::clone(&record);
            std::thread::spawn(move || {
                let mut last = 0;
                for _ in 0..1000 {
                    let now = record.bytes_read();
                    assert!(now >= last);
                    last = now;
                }
            })
        };
        for handle in writers {
            handle.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(record.bytes_read(), 4000);
    }

    fn any_status() -> impl Strategy<Value = UploadStatus> {
        prop_oneof![
            Just(UploadStatus::InProgress),
            Just(UploadStatus::ChunkedInProgress),
            Just(UploadStatus::Completed),
            Just(UploadStatus::Failed),
            Just(UploadStatus::Rejected),
            Just(UploadStatus::Cancelled),
        ]
    }

    proptest! {
        #[test]
        fn bytes_read_is_the_sum_and_never_decreases(amounts in prop::collection::vec(0u64..10_000, 0..64)) {
            let record = ProgressRecord::with_system_clock(None);
            let mut previous = 0;
            for n in &amounts {
                record.add_bytes_read(*n);
                let now = record.bytes_read();
                prop_assert!(now >= previous);
                previous = now;
            }
            prop_assert_eq!(record.bytes_read(), amounts.iter().sum::<u64>());
        }

        #[test]
        fn fraction_stays_in_unit_interval(total in 0u64..100_000, reads in prop::collection::vec(0u64..50_000, 0..8)) {
            let record = ProgressRecord::with_system_clock(None);
            record.set_totals(total, 0);
            for n in reads {
                record.add_bytes_read(n);
            }
            let fraction = record.fraction_complete();
            if total == 0 {
                prop_assert!(fraction.abs() < f64::EPSILON);
            } else {
                prop_assert!((0.0..=1.0).contains(&fraction));
            }
        }

        #[test]
        fn terminal_status_is_one_way(statuses in prop::collection::vec(any_status(), 1..12)) {
            let record = ProgressRecord::with_system_clock(None);
            let mut first_terminal = None;
            for status in statuses {
                record.set_status(status);
                if first_terminal.is_none() && status.is_terminal() {
                    first_terminal = Some(status);
                }
                if let Some(terminal) = first_terminal {
                    prop_assert_eq!(record.status(), terminal);
                    prop_assert!(record.stop_time().is_some());
                }
            }
        }
    }
}
