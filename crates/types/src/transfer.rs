//! Transfer identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque token correlating a receiving context with its pollers.
///
/// The id is the only credential needed to look a transfer up, so it is
/// never derived from request content. Callers hand it in verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransferId(String);

impl TransferId {
    /// Generate a fresh id for a new transfer attempt
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accept an id handed over by a collaborator.
    ///
    /// Blank input means the id has not been assigned yet and yields `None`.
    /// Anything else is kept exactly as given.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key under which every store tier keeps this transfer
    #[must_use]
    pub fn store_key(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.0)
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<TransferId> for String {
    fn from(id: TransferId) -> Self {
        id.0
    }
}
