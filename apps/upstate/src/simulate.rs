//! Simulated upload with concurrent pollers
//!
//! The receiver feeds a progress record chunk by chunk while a periodic sync
//! task publishes it. Pollers look the transfer up by id the way a client
//! polling a progress endpoint would.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use upstate_errors::UploadRejection;
use upstate_progress::{RecordSnapshot, SharedRecord};
use upstate_store::{MemorySession, SessionStore};
use upstate_sync::{spawn_periodic_sync, SyncCoordinator};
use upstate_types::{Outcome, TransferId, UploadStatus, UploadedFile};

use crate::cli::SimulateArgs;
use crate::display::OutputRenderer;
use crate::error::CliError;

/// Result of one simulated transfer
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub transfer_id: TransferId,
    pub status: UploadStatus,
    pub bytes_read: u64,
    pub bytes_total: u64,
    pub outcome: Option<Outcome>,
    /// What a poller without the client's session sees after completion
    pub late_poll: Option<RecordSnapshot>,
}

/// Run one transfer from start to completion
pub async fn simulate(
    coordinator: Arc<SyncCoordinator>,
    args: SimulateArgs,
    renderer: OutputRenderer,
) -> Result<SimulationReport, CliError> {
    if args.chunk_bytes == 0 {
        return Err(CliError::InvalidArguments(
            "--chunk-bytes must be greater than zero".to_string(),
        ));
    }
    if args.poll_interval_ms == 0 {
        return Err(CliError::InvalidArguments(
            "--poll-interval-ms must be greater than zero".to_string(),
        ));
    }
    let id = match &args.id {
        Some(raw) => TransferId::parse(raw).ok_or_else(|| {
            CliError::InvalidArguments("transfer id must not be blank".to_string())
        })?,
        None => TransferId::generate(),
    };

    let session: Option<Arc<dyn SessionStore>> = if args.no_session {
        None
    } else {
        Some(Arc::new(MemorySession::new()))
    };

    let local = coordinator.begin_transfer(Some(id.clone()), session.as_deref());
    local.set_totals(args.total_bytes, 0);
    local.set_content_length(args.total_bytes);
    local.set_file_sizes(vec![args.total_bytes]);
    local.set_current_file(args.file_name.clone());
    info!(transfer_id = %id, total_bytes = args.total_bytes, "simulated upload started");

    let sync_task = spawn_periodic_sync(&coordinator, Arc::clone(&local), session.clone());

    let receiver_done = Arc::new(AtomicBool::new(false));
    let pollers: Vec<_> = (0..args.pollers)
        .map(|index| {
            let poller = Poller {
                index,
                id: id.clone(),
                coordinator: Arc::clone(&coordinator),
                session: session.clone(),
                interval: Duration::from_millis(args.poll_interval_ms),
                cancel_after: args
                    .cancel_after_ms
                    .filter(|_| index == 0)
                    .map(Duration::from_millis),
                receiver_done: Arc::clone(&receiver_done),
                renderer,
            };
            tokio::spawn(poller.run())
        })
        .collect();

    receive(&local, &args).await;
    let status = coordinator.complete_transfer(&local, session.as_deref());
    receiver_done.store(true, Ordering::Release);
    info!(transfer_id = %id, %status, "simulated upload finished");

    sync_task.await?;
    for poller in pollers {
        poller.await??;
    }

    Ok(SimulationReport {
        transfer_id: id.clone(),
        status,
        bytes_read: local.bytes_read(),
        bytes_total: local.bytes_total(),
        outcome: local.outcome(),
        late_poll: coordinator.pull(&id, None),
    })
}

/// Feed the record until the body is consumed or the transfer stops
async fn receive(local: &SharedRecord, args: &SimulateArgs) {
    let delay = Duration::from_millis(args.chunk_delay_ms);
    let mut received = 0;
    while received < args.total_bytes {
        if local.status().is_terminal() {
            debug!(received, "receiver stopping early");
            return;
        }
        tokio::time::sleep(delay).await;
        let chunk = args.chunk_bytes.min(args.total_bytes - received);

        if let Some(limit) = args.reject_above {
            if received + chunk > limit {
                let rejection = UploadRejection::too_large(limit);
                local.fail(Outcome::from_error(&rejection, Some("receiver")));
                return;
            }
        }

        local.add_bytes_read(chunk);
        local.add_file_bytes_read(chunk);
        received += chunk;
    }
    local.add_file(
        "file",
        UploadedFile::new(args.file_name.clone()).with_size(received),
    );
}

struct Poller {
    index: usize,
    id: TransferId,
    coordinator: Arc<SyncCoordinator>,
    session: Option<Arc<dyn SessionStore>>,
    interval: Duration,
    cancel_after: Option<Duration>,
    receiver_done: Arc<AtomicBool>,
    renderer: OutputRenderer,
}

impl Poller {
    async fn run(self) -> Result<(), CliError> {
        let started = Instant::now();
        let mut cancel_after = self.cancel_after;
        loop {
            tokio::time::sleep(self.interval).await;

            if cancel_after.is_some_and(|after| started.elapsed() >= after) {
                cancel_after = None;
                self.coordinator.cancel(&self.id, self.session.as_deref());
            }

            match self.coordinator.pull(&self.id, self.session.as_deref()) {
                Some(snapshot) => {
                    self.renderer.render_poll(self.index, &snapshot)?;
                    if snapshot.is_terminal() {
                        return Ok(());
                    }
                }
                None if self.receiver_done.load(Ordering::Acquire) => return Ok(()),
                None => {}
            }
        }
    }
}
