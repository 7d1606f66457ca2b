//! The recognised rejection kind
//!
//! A rejection is an expected, classified refusal of an upload (size limit
//! exceeded, unsupported content, ...). The receiving pipeline raises it on
//! purpose, and progress records keep it apart from arbitrary failures.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UploadRejection {
    /// Protocol status code returned to the client (413, 415, ...)
    pub status_code: u16,
    pub message: String,
    pub help_link: Option<String>,
    /// Component that rejected the upload
    pub source_component: Option<String>,
}

impl UploadRejection {
    #[must_use]
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            help_link: None,
            source_component: None,
        }
    }

    /// Rejection for a request body larger than the configured limit
    #[must_use]
    pub fn too_large(limit: u64) -> Self {
        Self::new(413, format!("request exceeds the {limit} byte limit"))
    }

    #[must_use]
    pub fn with_help_link(mut self, link: impl Into<String>) -> Self {
        self.help_link = Some(link.into());
        self
    }

    #[must_use]
    pub fn with_source(mut self, component: impl Into<String>) -> Self {
        self.source_component = Some(component.into());
        self
    }
}

impl UserFacingError for UploadRejection {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self.status_code {
            413 => Some("Upload a smaller file or raise the request size limit."),
            415 => Some("Upload a file of a supported type."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self.status_code {
            400 => "rejection.bad_request",
            413 => "rejection.too_large",
            415 => "rejection.unsupported_media_type",
            500..=599 => "rejection.server",
            _ => "rejection.client",
        };
        Some(code)
    }
}
