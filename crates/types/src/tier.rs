//! Storage tiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a progress record can be published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Per-client session storage, shared by that client's requests
    Session,
    /// Process-wide map, used when no session is available
    Process,
    /// Time-limited cache holding finished transfers for late pollers
    Cache,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Process => "process",
            Self::Cache => "cache",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
