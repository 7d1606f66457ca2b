use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use upstate_progress::SharedRecord;
use upstate_store::SessionStore;

use crate::SyncCoordinator;

/// Publish `local` every sync interval while it changes.
///
/// Once the record is terminal the task publishes one last time and exits.
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_periodic_sync(
    coordinator: &Arc<SyncCoordinator>,
    local: SharedRecord,
    session: Option<Arc<dyn SessionStore>>,
) -> JoinHandle<()> {
    let coordinator = Arc::clone(coordinator);
    let interval = coordinator.options().sync_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if local.status().is_terminal() {
                coordinator.publish(&local, session.as_deref());
                break;
            }
            coordinator.publish_if_dirty(&local, session.as_deref());
        }
        debug!(transfer_id = ?local.transfer_id(), "periodic sync stopped");
    })
}
