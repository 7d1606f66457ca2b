#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Three-tier storage for published upload progress
//!
//! Records are published into the caller's session when it has a writable
//! one, otherwise into a process-wide map. Once a transfer finishes its
//! record moves into a time-limited cache so that a final poll still finds
//! it. Every tier keys records by `prefix + transfer id`.

mod cache;
mod session;

pub use cache::{CachePolicy, DEFAULT_CACHE_GRACE};
pub use session::{MemorySession, SessionState, SessionStore};

use cache::CacheTier;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use upstate_errors::StoreError;
use upstate_progress::{Clock, SharedRecord, SystemClock};
use upstate_types::{Tier, TransferId};

/// Key prefix shared by all tiers unless configured otherwise
pub const DEFAULT_KEY_PREFIX: &str = "upstate_";

/// Construction options for [`RecordStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub key_prefix: String,
    pub cache: CachePolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            cache: CachePolicy::default(),
        }
    }
}

/// Keyed lookup across the session, process and cache tiers.
///
/// The session tier belongs to the caller and is passed in per call; the
/// process and cache tiers live here.
#[derive(Debug)]
pub struct RecordStore {
    key_prefix: String,
    process: DashMap<String, SharedRecord>,
    cache: CacheTier,
}

impl RecordStore {
    #[must_use]
    pub fn new(options: StoreOptions, clock: Arc<dyn Clock>) -> Self {
        Self {
            key_prefix: options.key_prefix,
            process: DashMap::new(),
            cache: CacheTier::new(options.cache, clock),
        }
    }

    #[must_use]
    pub fn with_system_clock(options: StoreOptions) -> Self {
        Self::new(options, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn key(&self, id: &TransferId) -> String {
        id.store_key(&self.key_prefix)
    }

    #[must_use]
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    #[must_use]
    pub fn cache_policy(&self) -> CachePolicy {
        self.cache.policy()
    }

    /// Session to use for this call, if it is usable at all
    #[must_use]
    pub fn usable_session(session: Option<&dyn SessionStore>) -> Option<&dyn SessionStore> {
        session.filter(|s| s.state() == SessionState::Writable)
    }

    /// Look an id up in one tier
    ///
    /// # Errors
    ///
    /// Returns an error if the session tier is asked for and fails.
    pub fn lookup(
        &self,
        id: &TransferId,
        tier: Tier,
        session: Option<&dyn SessionStore>,
    ) -> Result<Option<SharedRecord>, StoreError> {
        let key = self.key(id);
        let found = match tier {
            Tier::Session => match Self::usable_session(session) {
                Some(session) => session.get(&key)?,
                None => None,
            },
            Tier::Process => self.process.get(&key).map(|r| Arc::clone(r.value())),
            Tier::Cache => self.cache.get(&key),
        };
        debug!(transfer_id = %id, %tier, found = found.is_some(), "tier read");
        Ok(found)
    }

    /// Find a record, trying the session, process and cache tiers in order.
    ///
    /// A failing session is skipped; a missing id is simply not found.
    #[must_use]
    pub fn fetch(&self, id: &TransferId, session: Option<&dyn SessionStore>) -> Option<SharedRecord> {
        if Self::usable_session(session).is_some() {
            match self.lookup(id, Tier::Session, session) {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(err) => debug!(transfer_id = %id, error = %err, "session read failed"),
            }
        }
        [Tier::Process, Tier::Cache]
            .into_iter()
            .find_map(|tier| self.lookup(id, tier, None).ok().flatten())
    }

    /// Store a record in one tier.
    ///
    /// Writing to the cache tier also drops the process-wide entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the session tier is asked for and is not writable
    /// or fails.
    pub fn register(
        &self,
        id: &TransferId,
        tier: Tier,
        record: SharedRecord,
        session: Option<&dyn SessionStore>,
    ) -> Result<(), StoreError> {
        let key = self.key(id);
        debug!(transfer_id = %id, %tier, "tier write");
        match tier {
            Tier::Session => match Self::usable_session(session) {
                Some(session) => session.insert(&key, record)?,
                None => return Err(StoreError::ReadOnly),
            },
            Tier::Process => {
                self.process.insert(key, record);
            }
            Tier::Cache => {
                self.process.remove(&key);
                self.cache.insert(key, record);
            }
        }
        Ok(())
    }

    /// Store a record in the process tier, which cannot refuse a write
    pub fn register_process(&self, id: &TransferId, record: SharedRecord) {
        debug!(transfer_id = %id, tier = %Tier::Process, "tier write");
        self.process.insert(self.key(id), record);
    }

    /// Move a finished transfer into the cache tier.
    ///
    /// The record is taken from the process tier, or from the session when
    /// the process tier does not hold it, and both entries are dropped.
    /// Returns `false` when no tier held the id.
    ///
    /// The record is marked demoted and the tier entries dropped while its
    /// lock is held. A publisher registers under the same lock, so it either
    /// lands before the removal or sees the flag and stays out.
    pub fn evict_terminal(&self, id: &TransferId, session: Option<&dyn SessionStore>) -> bool {
        let key = self.key(id);
        let session = Self::usable_session(session);
        let record = self
            .process
            .get(&key)
            .map(|r| Arc::clone(r.value()))
            .or_else(|| session.and_then(|s| s.get(&key).ok().flatten()));

        let Some(record) = record else {
            debug!(transfer_id = %id, "nothing to evict");
            return false;
        };

        let mut state = record.lock();
        state.mark_demoted();
        if let Some(session) = session {
            if let Err(err) = session.remove(&key) {
                debug!(transfer_id = %id, error = %err, "session entry not dropped");
            }
        }
        self.process.remove(&key);
        let status = state.status();
        self.cache.insert(key, Arc::clone(&record));
        drop(state);

        info!(transfer_id = %id, %status, "record demoted to cache");
        true
    }

    /// Whether the cache tier currently holds an unexpired record for `id`
    #[must_use]
    pub fn is_cached(&self, id: &TransferId) -> bool {
        self.cache.contains(&self.key(id))
    }

    /// Drop an id from the process and cache tiers, and from the session if
    /// one is given. Returns whether anything was removed.
    pub fn remove(&self, id: &TransferId, session: Option<&dyn SessionStore>) -> bool {
        let key = self.key(id);
        let from_session = Self::usable_session(session)
            .and_then(|s| s.remove(&key).ok().flatten())
            .is_some();
        let from_process = self.process.remove(&key).is_some();
        let from_cache = self.cache.remove(&key).is_some();
        debug!(transfer_id = %id, "record removed");
        from_session || from_process || from_cache
    }

    /// Drop expired cache entries, returning how many went
    pub fn purge_expired(&self) -> usize {
        let purged = self.cache.purge_expired();
        if purged > 0 {
            debug!(purged, "expired cache entries dropped");
        }
        purged
    }

    #[must_use]
    pub fn process_len(&self) -> usize {
        self.process.len()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

/// Run [`RecordStore::purge_expired`] every `interval` until the store is
/// dropped.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn spawn_cache_sweeper(store: &Arc<RecordStore>, interval: Duration) -> JoinHandle<()> {
    let store: Weak<RecordStore> = Arc::downgrade(store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                break;
            };
            store.purge_expired();
        }
    })
}
