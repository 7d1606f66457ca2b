//! Time-limited cache tier for finished transfers

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use upstate_progress::{Clock, SharedRecord};

/// Default time a finished record stays visible to late pollers
pub const DEFAULT_CACHE_GRACE: Duration = Duration::from_secs(60);

/// Expiry policy for cached records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub grace: Duration,
    /// Extend the expiry on every hit instead of counting from insertion
    pub sliding: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            grace: DEFAULT_CACHE_GRACE,
            sliding: true,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    record: SharedRecord,
    expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct CacheTier {
    entries: DashMap<String, CacheEntry>,
    policy: CachePolicy,
    clock: Arc<dyn Clock>,
}

impl CacheTier {
    pub(crate) fn new(policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            policy,
            clock,
        }
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let grace = TimeDelta::from_std(self.policy.grace).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(grace).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub(crate) fn insert(&self, key: String, record: SharedRecord) {
        let expires_at = self.expiry_from(self.clock.now());
        self.entries.insert(key, CacheEntry { record, expires_at });
    }

    pub(crate) fn get(&self, key: &str) -> Option<SharedRecord> {
        let now = self.clock.now();
        if let Some(mut entry) = self.entries.get_mut(key) {
            if now < entry.expires_at {
                if self.policy.sliding {
                    entry.expires_at = self.expiry_from(now);
                }
                return Some(Arc::clone(&entry.record));
            }
        } else {
            return None;
        }
        // Expired: drop lazily
        self.entries.remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .get(key)
            .is_some_and(|entry| now < entry.expires_at)
    }

    pub(crate) fn remove(&self, key: &str) -> Option<SharedRecord> {
        self.entries.remove(key).map(|(_, entry)| entry.record)
    }

    pub(crate) fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before.saturating_sub(self.entries.len())
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn policy(&self) -> CachePolicy {
        self.policy
    }
}
