//! Integration tests for publishing, pulling and completing transfers

use std::sync::{Arc, Barrier, Mutex};
use std::time::Duration;

use upstate_errors::StoreError;
use upstate_events::{channel, EventReceiver, TransferEvent};
use upstate_progress::{ManualClock, ProgressRecord, SharedRecord};
use upstate_store::{MemorySession, RecordStore, SessionState, SessionStore, StoreOptions};
use upstate_sync::{spawn_periodic_sync, SyncCoordinator, SyncOptions};
use upstate_types::{Outcome, Tier, TransferId, UploadStatus};

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<RecordStore>,
    coordinator: SyncCoordinator,
    events: EventReceiver,
}

fn harness() -> Harness {
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(RecordStore::new(StoreOptions::default(), clock.clone()));
    let (tx, events) = channel();
    let coordinator =
        SyncCoordinator::new(store.clone(), clock.clone(), SyncOptions::default()).with_events(tx);
    Harness {
        clock,
        store,
        coordinator,
        events,
    }
}

fn abc() -> TransferId {
    TransferId::parse("abc").unwrap()
}

fn drain(events: &mut EventReceiver) -> Vec<TransferEvent> {
    let mut out = Vec::new();
    while let Ok(message) = events.try_recv() {
        out.push(message.event);
    }
    out
}

/// Session whose every operation fails
#[derive(Debug)]
struct BrokenSession;

impl SessionStore for BrokenSession {
    fn state(&self) -> SessionState {
        SessionState::Writable
    }

    fn get(&self, _key: &str) -> Result<Option<SharedRecord>, StoreError> {
        Err(StoreError::SessionUnavailable {
            reason: "backend offline".to_string(),
        })
    }

    fn insert(&self, key: &str, _record: SharedRecord) -> Result<(), StoreError> {
        Err(StoreError::LockFailed {
            key: key.to_string(),
        })
    }

    fn remove(&self, _key: &str) -> Result<Option<SharedRecord>, StoreError> {
        Err(StoreError::ReadOnly)
    }
}

#[test]
fn end_to_end_poll_through_completion_and_grace_window() {
    let h = harness();
    let session = MemorySession::new();
    let local = h.coordinator.begin_transfer(Some(abc()), Some(&session));
    local.set_totals(1000, 0);

    for step in 1..=5 {
        local.add_bytes_read(100);
        assert_eq!(
            h.coordinator.publish(&local, Some(&session)),
            Some(Tier::Session)
        );
        h.clock.advance_millis(100);

        if step == 3 {
            let seen = h.coordinator.pull(&abc(), Some(&session)).unwrap();
            assert_eq!(seen.bytes_read, 300);
            assert!((seen.fraction_complete - 0.3).abs() < 1e-9);
            assert_eq!(seen.status, UploadStatus::InProgress);
        }
    }

    assert_eq!(
        h.coordinator.complete_transfer(&local, Some(&session)),
        UploadStatus::Completed
    );
    assert_eq!(h.store.process_len(), 0);
    assert!(session.is_empty());

    h.clock.advance_millis(30_000);
    let late = h.coordinator.pull(&abc(), None).unwrap();
    assert_eq!(late.status, UploadStatus::Completed);
    assert_eq!(late.bytes_read, 500);

    h.clock.advance_millis(61_000);
    assert!(h.coordinator.pull(&abc(), None).is_none());
}

#[test]
fn first_publish_replaces_stale_record() {
    let h = harness();
    let stale = Arc::new(ProgressRecord::new(Some(abc()), h.clock.clone()));
    stale.add_bytes_read(999);
    stale.cancel();
    h.store.register_process(&abc(), stale.clone());

    let local: SharedRecord = Arc::new(ProgressRecord::new(Some(abc()), h.clock.clone()));
    local.set_totals(50, 0);
    local.add_bytes_read(7);
    assert_eq!(h.coordinator.publish(&local, None), Some(Tier::Process));

    assert_eq!(local.status(), UploadStatus::InProgress);
    let stored = h.store.fetch(&abc(), None).unwrap();
    assert!(!Arc::ptr_eq(&stored, &stale));
    assert_eq!(stored.bytes_read(), 7);
    assert_eq!(stored.bytes_total(), 50);
    assert_eq!(stored.status(), UploadStatus::InProgress);
}

#[test]
fn cancellation_in_store_wins_over_local_progress() {
    let mut h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    local.add_bytes_read(10);
    h.coordinator.publish(&local, None);

    assert!(h.coordinator.cancel(&abc(), None));
    local.add_bytes_read(10);
    h.coordinator.publish(&local, None);

    assert_eq!(local.status(), UploadStatus::Cancelled);
    assert!(local.stop_time().is_some());
    assert!(!local.add_bytes_read(1));
    let stored = h.coordinator.pull(&abc(), None).unwrap();
    assert_eq!(stored.bytes_read, 10);

    let events = drain(&mut h.events);
    assert!(events
        .iter()
        .any(|e| matches!(e, TransferEvent::CancelRequested { .. })));
    assert!(events.iter().any(|e| matches!(
        e,
        TransferEvent::StatusPulledDown {
            status: UploadStatus::Cancelled,
            ..
        }
    )));
}

#[test]
fn completion_does_not_override_cancellation() {
    let h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    h.coordinator.publish(&local, None);
    h.coordinator.cancel(&abc(), None);

    assert_eq!(
        h.coordinator.complete_transfer(&local, None),
        UploadStatus::Cancelled
    );
    let seen = h.coordinator.pull(&abc(), None).unwrap();
    assert_eq!(seen.status, UploadStatus::Cancelled);
}

#[test]
fn cancel_is_idempotent_even_after_completion() {
    let h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    h.coordinator.complete_transfer(&local, None);

    assert!(!h.coordinator.cancel(&abc(), None));
    assert!(!h.coordinator.cancel(&abc(), None));
    assert_eq!(
        h.coordinator.pull(&abc(), None).unwrap().status,
        UploadStatus::Completed
    );
}

#[test]
fn failure_survives_completion() {
    let h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    local.fail(Outcome::failure("disk full"));

    assert_eq!(
        h.coordinator.complete_transfer(&local, None),
        UploadStatus::Failed
    );
    let seen = h.coordinator.pull(&abc(), None).unwrap();
    assert_eq!(seen.status, UploadStatus::Failed);
    assert_eq!(seen.outcome.unwrap().message(), "disk full");
}

#[test]
fn broken_session_falls_back_for_the_rest_of_the_attempt() {
    let mut h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), Some(&BrokenSession));
    assert!(!local.session_available());
    assert_eq!(h.store.process_len(), 1);

    local.add_bytes_read(3);
    assert_eq!(
        h.coordinator.publish(&local, Some(&BrokenSession)),
        Some(Tier::Process)
    );

    // A healthy session later on is still not used
    let healthy = MemorySession::new();
    assert_eq!(
        h.coordinator.publish(&local, Some(&healthy)),
        Some(Tier::Process)
    );
    assert!(healthy.is_empty());

    let unavailable = drain(&mut h.events)
        .into_iter()
        .filter(|e| matches!(e, TransferEvent::SessionUnavailable { .. }))
        .count();
    assert_eq!(unavailable, 1);
}

#[test]
fn read_only_session_publishes_process_wide() {
    let h = harness();
    let session = MemorySession::with_state(SessionState::ReadOnly);
    let local = h.coordinator.begin_transfer(Some(abc()), Some(&session));
    local.add_bytes_read(1);

    assert_eq!(
        h.coordinator.publish(&local, Some(&session)),
        Some(Tier::Process)
    );
    assert!(!local.session_available());
    assert_eq!(h.coordinator.pull(&abc(), None).unwrap().bytes_read, 1);
}

#[test]
fn missing_id_is_never_published() {
    let h = harness();
    let local = h.coordinator.begin_transfer(TransferId::parse("  "), None);
    local.add_bytes_read(5);
    assert_eq!(h.coordinator.publish(&local, None), None);
    assert!(!h.coordinator.pull_into(&local, None));
    assert_eq!(h.store.process_len(), 0);
}

#[test]
fn async_completion_counts_files_without_demoting() {
    let h = harness();
    let local = h.coordinator.begin_async_transfer(Some(abc()), None);
    local.set_file_sizes(vec![10, 20]);

    h.coordinator.complete_transfer(&local, None);
    h.coordinator.complete_transfer(&local, None);

    assert_eq!(local.status(), UploadStatus::InProgress);
    let seen = h.coordinator.pull(&abc(), None).unwrap();
    assert_eq!(seen.async_files_received, 2);
    assert_eq!(seen.file_sizes, vec![10, 20]);
    assert!(seen.is_async);
    assert_eq!(h.store.cache_len(), 0);
}

#[test]
fn pull_into_overwrites_local_record() {
    let h = harness();
    let receiver = h.coordinator.begin_transfer(Some(abc()), None);
    receiver.set_totals(100, 0);
    receiver.add_bytes_read(40);
    receiver.set_current_file("a.bin");
    receiver.set_content_length(120);
    h.coordinator.publish(&receiver, None);

    let mirror: SharedRecord = Arc::new(ProgressRecord::new(Some(abc()), h.clock.clone()));
    assert!(h.coordinator.pull_into(&mirror, None));
    assert_eq!(mirror.bytes_read(), 40);
    assert_eq!(mirror.bytes_total(), 100);
    assert_eq!(mirror.current_file_name(), "a.bin");
    assert_eq!(mirror.content_length(), 120);
}

#[test]
fn demoted_record_is_not_republished() {
    let h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    h.coordinator.complete_transfer(&local, None);

    assert_eq!(h.coordinator.publish(&local, None), None);
    assert_eq!(h.store.process_len(), 0);
    assert!(h.store.is_cached(&abc()));
}

#[test]
fn publish_if_dirty_skips_unchanged_records() {
    let h = harness();
    let local = h.coordinator.begin_transfer(Some(abc()), None);
    assert!(h.coordinator.publish_if_dirty(&local, None).is_some());
    assert!(h.coordinator.publish_if_dirty(&local, None).is_none());
    local.add_bytes_read(1);
    assert!(h.coordinator.publish_if_dirty(&local, None).is_some());
}

#[tokio::test(start_paused = true)]
async fn periodic_sync_publishes_until_terminal() {
    let h = harness();
    let coordinator = Arc::new(h.coordinator);
    let session: Arc<dyn SessionStore> = Arc::new(MemorySession::new());
    let local = coordinator.begin_transfer(Some(abc()), Some(session.as_ref()));

    let handle = spawn_periodic_sync(&coordinator, local.clone(), Some(session.clone()));
    local.add_bytes_read(64);
    tokio::time::sleep(Duration::from_millis(600)).await;
    let seen = coordinator.pull(&abc(), Some(session.as_ref())).unwrap();
    assert_eq!(seen.bytes_read, 64);

    local.add_bytes_read(36);
    local.set_status(UploadStatus::Completed);
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(handle.is_finished());

    let seen = coordinator.pull(&abc(), Some(session.as_ref())).unwrap();
    assert_eq!(seen.bytes_read, 100);
    assert_eq!(seen.status, UploadStatus::Completed);
}

#[test]
fn concurrent_receiver_and_pollers_see_monotonic_progress() {
    let h = harness();
    let coordinator = Arc::new(h.coordinator);
    let local = coordinator.begin_transfer(Some(abc()), None);
    local.set_totals(10_000, 0);
    coordinator.publish(&local, None);

    let last_seen = Arc::new(Mutex::new(0u64));
    let pollers: Vec<_> = (0..3)
        .map(|_| {
            let coordinator = Arc::clone(&coordinator);
            let last_seen = Arc::clone(&last_seen);
            std::thread::spawn(move || {
                let mut previous = 0;
                for _ in 0..500 {
                    if let Some(seen) = coordinator.pull(&abc(), None) {
                        assert!(seen.bytes_read >= previous);
                        assert!((0.0..=1.0).contains(&seen.fraction_complete));
                        previous = seen.bytes_read;
                    }
                }
                let mut last = last_seen.lock().unwrap();
                *last = (*last).max(previous);
            })
        })
        .collect();

    for _ in 0..100 {
        local.add_bytes_read(100);
        coordinator.publish(&local, None);
    }
    for poller in pollers {
        poller.join().unwrap();
    }
    assert!(*last_seen.lock().unwrap() <= 10_000);
    assert_eq!(coordinator.pull(&abc(), None).unwrap().bytes_read, 10_000);
}

#[test]
fn publish_racing_completion_never_leaves_a_live_entry_behind() {
    let h = harness();
    for _ in 0..500 {
        let local = h.coordinator.begin_transfer(Some(abc()), None);
        h.coordinator.publish(&local, None);
        local.set_status(UploadStatus::Completed);

        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                h.coordinator.publish(&local, None);
            });
            barrier.wait();
            h.coordinator.complete_transfer(&local, None);
        });

        assert_eq!(h.store.process_len(), 0);
        assert!(h.store.is_cached(&abc()));
        h.store.remove(&abc(), None);
    }
}

#[test]
fn first_publish_racing_completion_in_session_tier() {
    let h = harness();
    let session = MemorySession::new();
    for _ in 0..500 {
        let local = h.coordinator.begin_transfer(Some(abc()), Some(&session));
        local.add_bytes_read(10);

        let barrier = Barrier::new(2);
        std::thread::scope(|s| {
            s.spawn(|| {
                barrier.wait();
                h.coordinator.publish(&local, Some(&session));
            });
            barrier.wait();
            h.coordinator.complete_transfer(&local, Some(&session));
        });

        assert!(session.is_empty());
        assert_eq!(h.store.process_len(), 0);
        let seen = h.coordinator.pull(&abc(), Some(&session)).unwrap();
        assert_eq!(seen.status, UploadStatus::Completed);
        h.store.remove(&abc(), Some(&session));
    }
}
