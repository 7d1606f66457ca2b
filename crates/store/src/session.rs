//! Session-scoped storage

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use upstate_errors::StoreError;
use upstate_progress::SharedRecord;

/// Availability of a client's session storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Writable,
    ReadOnly,
    Disabled,
}

/// Per-client storage shared by that client's requests.
///
/// Implementations may be backed by anything. Every error is taken to mean
/// the session cannot be used for the rest of the transfer attempt.
pub trait SessionStore: Send + Sync + fmt::Debug {
    fn state(&self) -> SessionState;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<SharedRecord>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn insert(&self, key: &str, record: SharedRecord) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<Option<SharedRecord>, StoreError>;
}

/// In-memory session storage
#[derive(Debug, Default)]
pub struct MemorySession {
    state: Mutex<SessionState>,
    records: Mutex<HashMap<String, SharedRecord>>,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_state(state: SessionState) -> Self {
        Self {
            state: Mutex::new(state),
            records: Mutex::default(),
        }
    }

    pub fn set_state(&self, state: SessionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn writable(&self) -> Result<(), StoreError> {
        match self.state() {
            SessionState::Writable => Ok(()),
            SessionState::ReadOnly => Err(StoreError::ReadOnly),
            SessionState::Disabled => Err(StoreError::SessionUnavailable {
                reason: "session state is disabled".to_string(),
            }),
        }
    }
}

impl SessionStore for MemorySession {
    fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, key: &str) -> Result<Option<SharedRecord>, StoreError> {
        if self.state() == SessionState::Disabled {
            return Err(StoreError::SessionUnavailable {
                reason: "session state is disabled".to_string(),
            });
        }
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(key).cloned())
    }

    fn insert(&self, key: &str, record: SharedRecord) -> Result<(), StoreError> {
        self.writable()?;
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), record);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<Option<SharedRecord>, StoreError> {
        self.writable()?;
        Ok(self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key))
    }
}
