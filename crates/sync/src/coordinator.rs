use std::sync::Arc;

use tracing::{debug, info, warn};
use upstate_errors::StoreError;
use upstate_events::{EventEmitter, EventSender, FailureContext, TransferEvent};
use upstate_progress::{Clock, ProgressRecord, RecordSnapshot, SharedRecord};
use upstate_store::{RecordStore, SessionState, SessionStore};
use upstate_types::{Tier, TransferId};

use crate::SyncOptions;

/// Moves progress between local records and the record store
#[derive(Debug)]
pub struct SyncCoordinator {
    store: Arc<RecordStore>,
    clock: Arc<dyn Clock>,
    options: SyncOptions,
    events: Option<EventSender>,
}

impl EventEmitter for SyncCoordinator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl SyncCoordinator {
    #[must_use]
    pub fn new(store: Arc<RecordStore>, clock: Arc<dyn Clock>, options: SyncOptions) -> Self {
        Self {
            store,
            clock,
            options,
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    #[must_use]
    pub fn options(&self) -> SyncOptions {
        self.options
    }

    pub(crate) fn new_record(&self, id: Option<TransferId>) -> ProgressRecord {
        ProgressRecord::new(id, Arc::clone(&self.clock)).with_rate_window(self.options.rate_window)
    }

    pub(crate) fn emit_all(&self, events: Vec<TransferEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Tier the local record should be written to.
    ///
    /// A session that is present but not writable is recorded as unavailable
    /// on the local record, after which only the process tier is used.
    pub(crate) fn target_tier(
        &self,
        id: &TransferId,
        local: &ProgressRecord,
        session: Option<&dyn SessionStore>,
        events: &mut Vec<TransferEvent>,
    ) -> Tier {
        let Some(session) = session else {
            return Tier::Process;
        };
        if !local.session_available() {
            return Tier::Process;
        }
        match session.state() {
            SessionState::Writable => Tier::Session,
            SessionState::ReadOnly => {
                self.session_failed(id, local, &StoreError::ReadOnly, events);
                Tier::Process
            }
            SessionState::Disabled => {
                let err = StoreError::SessionUnavailable {
                    reason: "session state is disabled".to_string(),
                };
                self.session_failed(id, local, &err, events);
                Tier::Process
            }
        }
    }

    pub(crate) fn session_failed(
        &self,
        id: &TransferId,
        local: &ProgressRecord,
        err: &StoreError,
        events: &mut Vec<TransferEvent>,
    ) {
        local.lock().mark_session_unavailable();
        warn!(transfer_id = %id, error = %err, "session tier unavailable, publishing process-wide");
        events.push(TransferEvent::SessionUnavailable {
            transfer_id: id.clone(),
            failure: FailureContext::from_error(err),
        });
    }

    /// Copy the local record into the store.
    ///
    /// Returns the tier written to, or `None` when there was nothing to
    /// publish: the record has no transfer id, or it already finished and
    /// was demoted to the cache tier.
    pub fn publish(
        &self,
        local: &SharedRecord,
        session: Option<&dyn SessionStore>,
    ) -> Option<Tier> {
        let id = local.transfer_id()?;
        let mut events = Vec::new();

        let tier = self.target_tier(&id, local, session, &mut events);
        let written = match self.publish_into(&id, local, tier, session, &mut events) {
            Ok(written) => written,
            Err(err) => {
                self.session_failed(&id, local, &err, &mut events);
                self.publish_into(&id, local, Tier::Process, None, &mut events)
                    .unwrap_or_default()
            }
        };

        self.emit_all(events);
        written
    }

    /// Publish only when the local record changed since the last publish, or
    /// has never been published
    pub fn publish_if_dirty(
        &self,
        local: &SharedRecord,
        session: Option<&dyn SessionStore>,
    ) -> Option<Tier> {
        let pending = {
            let mut state = local.lock();
            state.take_dirty() || state.never_synced()
        };
        if pending {
            self.publish(local, session)
        } else {
            None
        }
    }

    fn publish_into(
        &self,
        id: &TransferId,
        local: &SharedRecord,
        tier: Tier,
        session: Option<&dyn SessionStore>,
        events: &mut Vec<TransferEvent>,
    ) -> Result<Option<Tier>, StoreError> {
        // The local lock is held across lookup and registration, so publishes
        // of one record run one at a time. Registration also happens under the
        // stored record's lock so it cannot interleave with a demotion.
        let mut local_state = local.lock();
        let first = local_state.never_synced();
        let existing = self.store.lookup(id, tier, session)?;

        let stored = match existing {
            Some(stored) if !first => stored,
            existing => {
                if existing.is_none()
                    && local_state.status().is_terminal()
                    && self.store.is_cached(id)
                {
                    debug!(transfer_id = %id, "record already demoted, not republishing");
                    return Ok(None);
                }
                Arc::new(self.new_record(Some(id.clone())))
            }
        };

        let (pulled_down, demoted) = if Arc::ptr_eq(&stored, local) {
            let demoted = local_state.is_demoted();
            if !demoted {
                self.register_stored(id, tier, &stored, session)?;
                local_state.mark_synced();
            }
            (false, demoted)
        } else {
            let mut stored_state = stored.lock();
            let pulled_down = if stored_state.status().is_terminal() {
                let changed = local_state.status() != stored_state.status();
                local_state.adopt_status(stored_state.status(), stored_state.stop_time());
                changed
            } else {
                stored_state.copy_progress_from(&local_state);
                false
            };
            let demoted = stored_state.is_demoted();
            if !demoted {
                self.register_stored(id, tier, &stored, session)?;
                local_state.mark_synced();
                stored_state.mark_synced();
            }
            (pulled_down, demoted)
        };
        local_state.take_dirty();
        let bytes_read = local_state.bytes_read();
        let status = local_state.status();
        drop(local_state);

        if pulled_down {
            info!(transfer_id = %id, %status, "terminal status pulled down from store");
            events.push(TransferEvent::StatusPulledDown {
                transfer_id: id.clone(),
                status,
            });
        }
        if demoted {
            debug!(transfer_id = %id, "record demoted meanwhile, not republishing");
            return Ok(None);
        }

        if first {
            info!(transfer_id = %id, %tier, bytes_read, %status, "first publish");
        } else {
            debug!(transfer_id = %id, %tier, bytes_read, %status, "published");
        }
        events.push(TransferEvent::Published {
            transfer_id: id.clone(),
            tier,
            bytes_read,
            status,
        });
        Ok(Some(tier))
    }

    fn register_stored(
        &self,
        id: &TransferId,
        tier: Tier,
        stored: &SharedRecord,
        session: Option<&dyn SessionStore>,
    ) -> Result<(), StoreError> {
        match tier {
            Tier::Process => {
                self.store.register_process(id, Arc::clone(stored));
                Ok(())
            }
            _ => self.store.register(id, tier, Arc::clone(stored), session),
        }
    }

    /// Snapshot of the stored record for `id`, if any tier holds it
    #[must_use]
    pub fn pull(&self, id: &TransferId, session: Option<&dyn SessionStore>) -> Option<RecordSnapshot> {
        self.store.fetch(id, session).map(|record| record.snapshot())
    }

    /// Overwrite `local` with the stored record for its id.
    ///
    /// Returns `false` when the record has no id or nothing is stored.
    pub fn pull_into(&self, local: &SharedRecord, session: Option<&dyn SessionStore>) -> bool {
        let Some(id) = local.transfer_id() else {
            return false;
        };
        let session = session.filter(|_| local.session_available());
        let Some(stored) = self.store.fetch(&id, session) else {
            return false;
        };
        if !Arc::ptr_eq(&stored, local) {
            let mut local_state = local.lock();
            let stored_state = stored.lock();
            local_state.copy_all_from(&stored_state);
        }
        debug!(transfer_id = %id, "pulled stored record");
        true
    }

    /// Ask the transfer with `id` to stop.
    ///
    /// Any context holding the id may call this. The receiving context picks
    /// the cancellation up on its next publish. Returns whether the stored
    /// record changed.
    pub fn cancel(&self, id: &TransferId, session: Option<&dyn SessionStore>) -> bool {
        let Some(stored) = self.store.fetch(id, session) else {
            debug!(transfer_id = %id, "cancel for unknown transfer");
            return false;
        };
        let changed = stored.cancel();
        if changed {
            info!(transfer_id = %id, "cancel requested");
            self.emit(TransferEvent::CancelRequested {
                transfer_id: id.clone(),
            });
        }
        changed
    }
}
