//! Uploaded file handles and per-field processing state

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Opaque per-field processing state, keyed by field id.
///
/// Collaborators own the contents; the progress record only carries them.
pub type FieldStates = BTreeMap<String, serde_json::Value>;

/// Handle to a file received as part of an upload.
///
/// The bytes themselves live wherever the storage collaborator put them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    /// Location assigned by the storage backend, if any
    pub location: Option<PathBuf>,
    pub size: u64,
}

impl UploadedFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            location: None,
            size: 0,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.location = Some(location.into());
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }
}
