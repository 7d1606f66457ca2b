//! Beginning and completing transfers

use std::sync::Arc;

use tracing::info;
use upstate_events::{EventEmitter, TransferEvent};
use upstate_progress::SharedRecord;
use upstate_store::SessionStore;
use upstate_types::{Tier, TransferId, UploadStatus};

use crate::SyncCoordinator;

impl SyncCoordinator {
    /// Create the local record for a new transfer attempt and make it
    /// visible to pollers.
    ///
    /// The record goes into the session when it is writable and into the
    /// process tier otherwise. Without an id the record is purely local.
    pub fn begin_transfer(
        &self,
        id: Option<TransferId>,
        session: Option<&dyn SessionStore>,
    ) -> SharedRecord {
        self.begin(id, false, session)
    }

    /// Begin a transfer whose files arrive in separate requests
    pub fn begin_async_transfer(
        &self,
        id: Option<TransferId>,
        session: Option<&dyn SessionStore>,
    ) -> SharedRecord {
        self.begin(id, true, session)
    }

    fn begin(
        &self,
        id: Option<TransferId>,
        is_async: bool,
        session: Option<&dyn SessionStore>,
    ) -> SharedRecord {
        let record: SharedRecord = Arc::new(self.new_record(id.clone()));
        if is_async {
            record.set_async(true);
        }
        let Some(id) = id else {
            return record;
        };

        let mut events = Vec::new();
        let mut tier = self.target_tier(&id, &record, session, &mut events);
        if tier == Tier::Session {
            if let Err(err) = self
                .store()
                .register(&id, tier, Arc::clone(&record), session)
            {
                self.session_failed(&id, &record, &err, &mut events);
                tier = Tier::Process;
            }
        }
        if tier == Tier::Process {
            self.store().register_process(&id, Arc::clone(&record));
        }

        info!(transfer_id = %id, %tier, is_async, "transfer started");
        events.push(TransferEvent::Started {
            transfer_id: id,
            tier,
        });
        self.emit_all(events);
        record
    }

    /// Finish the request that fed `local`.
    ///
    /// For an ordinary transfer the status becomes `Completed` unless it
    /// already failed or was rejected, the record is published, and the
    /// stored record moves to the cache tier. For an async transfer the
    /// received-file count goes up and the record is published without
    /// being demoted. Returns the local status afterwards.
    pub fn complete_transfer(
        &self,
        local: &SharedRecord,
        session: Option<&dyn SessionStore>,
    ) -> UploadStatus {
        if local.is_async() {
            local.increment_async_files_received();
            self.publish(local, session);
            return local.status();
        }

        if !matches!(local.status(), UploadStatus::Failed | UploadStatus::Rejected) {
            local.set_status(UploadStatus::Completed);
        }
        self.publish(local, session);

        let status = local.status();
        if let Some(id) = local.transfer_id() {
            let session = session.filter(|_| local.session_available());
            if self.store().evict_terminal(&id, session) {
                self.emit(TransferEvent::Demoted {
                    transfer_id: id,
                    status,
                });
            }
        }
        status
    }
}
